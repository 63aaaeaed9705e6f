use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::Value as JsonValue;

use crate::envelope::Envelope;
use crate::error::{ApiError, ErrorMessage};
use crate::handlers::required_str;
use crate::models::DeleteResponse;
use crate::routes;
use crate::state::AppState;

/// DELETE /article - remove an article by key.
///
/// Succeeds whether or not the key existed; the prior record rides along in
/// `DeleteItem` when there was one.
#[utoipa::path(
    delete,
    path = routes::ARTICLE,
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Delete performed", body = DeleteResponse),
        (status = 400, description = "Malformed payload or missing articleId", body = ErrorMessage),
        (status = 500, description = "Storage error", body = ErrorMessage)
    ),
    tag = "articles"
)]
pub async fn delete_article_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload?;
    let article_id = required_str(&payload, "articleId")?;

    let prior = state.store.delete(&article_id).await?;
    tracing::info!("Deleted article {article_id} (existed: {})", prior.is_some());

    let body = DeleteResponse {
        operation: "DELETE".to_string(),
        message: "SUCCESS".to_string(),
        delete_item: prior.map(|article| article.to_plain_json()).transpose()?,
    };
    Ok(Envelope::json(StatusCode::OK, serde_json::to_value(&body)?))
}
