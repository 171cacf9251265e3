use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("request to GitHub failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("search result is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid credential: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, GithubError>;

/// A user as returned by the user search endpoint, before enrichment.
///
/// Every field is optional so that one incomplete item cannot sink the whole
/// page; a candidate without `login` or `url` fails on its own during
/// enrichment.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchUser {
    pub id: Option<u64>,
    pub login: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    /// API URL of the full account record.
    pub url: Option<String>,
}

impl SearchUser {
    pub fn login(&self) -> Result<&str> {
        self.login.as_deref().ok_or(GithubError::MissingField("login"))
    }

    pub fn detail_url(&self) -> Result<&str> {
        self.url.as_deref().ok_or(GithubError::MissingField("url"))
    }
}

#[derive(Debug, Deserialize)]
struct UserSearchPage {
    items: Vec<SearchUser>,
}

#[derive(Debug, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub public_repos: u64,
}

/// The per-repository fields the enrichment aggregates over.
#[derive(Clone, Debug, Deserialize)]
pub struct RepoSummary {
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub size: u64,
    pub languages_url: String,
}

/// Language name to byte count, in the order GitHub returned them.
pub type LanguageMap = Map<String, Value>;

/// Thin REST client for the GitHub endpoints the proxy forwards to.
#[derive(Clone)]
pub struct GithubClient {
    http: Arc<Client>,
    api_url: Arc<str>,
}

impl GithubClient {
    /// Build a client that attaches the configured credential to every request.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("github-search-proxy"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http: Arc::new(http),
            api_url: Arc::from(config.api_url.as_str()),
        })
    }

    /// GET `url` and return the body as JSON, failing on any non-success status.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!(%url, "GitHub request");

        let mut req = self.http.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GithubError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| GithubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn pagination(q: &str, page: u32, per_page: u32) -> [(&'static str, String); 3] {
        [
            ("q", q.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ]
    }

    /// Repository search; the upstream body is passed back untouched.
    pub async fn search_repositories(&self, q: &str, page: u32, per_page: u32) -> Result<Value> {
        let url = format!("{}/search/repositories", self.api_url);
        self.get_json(&url, &Self::pagination(q, page, per_page)).await
    }

    /// One page of user search candidates.
    pub async fn search_users(
        &self,
        q: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<SearchUser>> {
        let url = format!("{}/search/users", self.api_url);
        let results: UserSearchPage = self
            .get_json(&url, &Self::pagination(q, page, per_page))
            .await?;
        Ok(results.items)
    }

    /// Full account record, fetched from the `url` the search result carries.
    pub async fn user_details(&self, user: &SearchUser) -> Result<UserDetails> {
        self.get_json(user.detail_url()?, &[]).await
    }

    /// Repositories owned by `login` (first page, as GitHub returns it).
    pub async fn user_repos(&self, user: &SearchUser) -> Result<Vec<RepoSummary>> {
        let url = format!("{}/users/{}/repos", self.api_url, user.login()?);
        self.get_json(&url, &[]).await
    }

    pub async fn repo_languages(&self, repo: &RepoSummary) -> Result<LanguageMap> {
        self.get_json(&repo.languages_url, &[]).await
    }
}
