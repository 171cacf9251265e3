use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::enrich::Enricher;
use crate::github::GithubClient;
use crate::query::normalize_query;
use crate::stats::EnrichedUser;

const USER_SEARCH_FAILED: &str = "Failed to fetch data from GitHub";

#[derive(Clone)]
pub struct AppState {
    client: GithubClient,
    enricher: Enricher,
}

impl AppState {
    pub fn new(config: &Config) -> crate::github::Result<Self> {
        let client = GithubClient::new(config)?;
        let enricher = Enricher::new(client.clone(), config.max_concurrent_users);
        Ok(Self { client, enricher })
    }
}

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 10;

/// Raw query string values; pagination that is missing, empty or not a number
/// falls back to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    page: Option<String>,
    per_page: Option<String>,
}

impl SearchParams {
    fn page(&self) -> u32 {
        parse_or(self.page.as_deref(), DEFAULT_PAGE)
    }

    fn per_page(&self) -> u32 {
        parse_or(self.per_page.as_deref(), DEFAULT_PER_PAGE)
    }
}

fn parse_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Serialize)]
struct UserSearchResponse {
    items: Vec<EnrichedUser>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/search/repositories", get(search_repositories))
        .route("/api/search/users", get(search_users))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn search_repositories(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let q = normalize_query(&params.q);

    match state
        .client
        .search_repositories(&q, params.page(), params.per_page())
        .await
    {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching repositories");
            error_response(e.to_string())
        }
    }
}

async fn search_users(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let (page, per_page) = (params.page(), params.per_page());
    tracing::info!(q = %params.q, page, per_page, "Searching users");

    let users = match state
        .client
        .search_users(&params.q, page, per_page)
        .await
    {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(error = %e, "{USER_SEARCH_FAILED}");
            return error_response(USER_SEARCH_FAILED.to_string());
        }
    };
    tracing::info!("Fetched {} users", users.len());

    let items = state.enricher.enrich_all(&users).await;
    Json(UserSearchResponse { items }).into_response()
}
