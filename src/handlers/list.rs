use axum::extract::State;
use axum::http::StatusCode;

use crate::envelope::Envelope;
use crate::error::{ApiError, ErrorMessage};
use crate::models::ArticlesResponse;
use crate::routes;
use crate::state::AppState;

/// GET /articles - read every article.
///
/// The store scans page by page; continuation markers are followed until
/// exhausted, so the caller always sees the complete set in one response.
#[utoipa::path(
    get,
    path = routes::ARTICLES,
    responses(
        (status = 200, description = "All stored articles", body = ArticlesResponse),
        (status = 500, description = "Storage error", body = ErrorMessage)
    ),
    tag = "articles"
)]
pub async fn read_articles_handler(
    State(state): State<AppState>,
) -> Result<Envelope, ApiError> {
    let articles = state.store.scan_all().await?;

    let items = articles
        .iter()
        .map(|article| article.to_plain_json())
        .collect::<anyhow::Result<Vec<_>>>()?;

    tracing::info!("Read {} articles", items.len());

    let body = ArticlesResponse { articles: items };
    Ok(Envelope::json(StatusCode::OK, serde_json::to_value(&body)?))
}
