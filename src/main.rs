mod config;
mod enrich;
mod github;
mod query;
mod server;
mod stats;

use anyhow::Context;
use config::Config;
use server::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("github_search_proxy=info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.token.is_none() {
        tracing::warn!("no GitHub token configured; requests will be unauthenticated");
    }

    let state = AppState::new(&config).context("Failed to build GitHub client")?;
    let app = server::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Server is running on http://{local_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
