use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::Value as JsonValue;

use crate::article::Article;
use crate::envelope::Envelope;
use crate::error::{ApiError, ErrorMessage};
use crate::models::SaveResponse;
use crate::routes;
use crate::state::AppState;

/// POST /article - store a new article.
///
/// The whole payload is the record; a record already stored under the same
/// articleId is overwritten silently.
#[utoipa::path(
    post,
    path = routes::ARTICLE,
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Article stored", body = SaveResponse),
        (status = 400, description = "Malformed payload or missing articleId", body = ErrorMessage),
        (status = 500, description = "Storage error", body = ErrorMessage)
    ),
    tag = "articles"
)]
pub async fn create_article_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload?;
    let article = Article::from_json(&payload)?;

    state.store.put(&article).await?;
    tracing::info!("Created article {}", article.article_id());

    let body = SaveResponse {
        operation: "SAVE".to_string(),
        message: "SUCCESS".to_string(),
        item: payload,
    };
    Ok(Envelope::json(StatusCode::OK, serde_json::to_value(&body)?))
}
