mod api_doc;
mod article;
mod config;
mod envelope;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use anyhow::Context;

use config::Config;
use state::AppState;
use store::ArticleStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("articles-api starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = ArticleStore::from_config(&config).await?;

    let addr = config.listen_addr();
    let state = AppState {
        store,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, routes::router(state))
        .await
        .context("server error")?;

    Ok(())
}
