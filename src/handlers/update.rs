use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::Value as JsonValue;

use crate::article::AttrValue;
use crate::envelope::Envelope;
use crate::error::{ApiError, ErrorMessage};
use crate::handlers::required_str;
use crate::models::UpdateResponse;
use crate::routes;
use crate::state::AppState;

/// PATCH /article - set one field on an existing article.
///
/// `updateValue` may be any JSON value, including null; it only has to be
/// present. The key attribute itself cannot be the update target.
#[utoipa::path(
    patch,
    path = routes::ARTICLE,
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Field updated", body = UpdateResponse),
        (status = 400, description = "Malformed payload or invalid update target", body = ErrorMessage),
        (status = 404, description = "No article under that key", body = ErrorMessage),
        (status = 500, description = "Storage error", body = ErrorMessage)
    ),
    tag = "articles"
)]
pub async fn update_article_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload?;
    let article_id = required_str(&payload, "articleId")?;
    let update_key = required_str(&payload, "updateKey")?;
    let update_value = payload
        .get("updateValue")
        .ok_or(ApiError::MissingField("updateValue"))?;

    if update_key == "articleId" {
        return Err(ApiError::ImmutableField("articleId"));
    }

    let new_value = AttrValue::from_json(update_value);
    let Some(updated) = state.store.update(&article_id, &update_key, new_value).await? else {
        return Err(ApiError::NotFound(article_id));
    };

    tracing::info!("Updated field {update_key} on article {article_id}");

    let mut attributes = serde_json::Map::new();
    for (key, value) in &updated {
        attributes.insert(key.clone(), value.to_plain()?);
    }

    let body = UpdateResponse {
        operation: "UPDATE".to_string(),
        message: "SUCCESS".to_string(),
        update_attributes: JsonValue::Object(attributes),
    };
    Ok(Envelope::json(StatusCode::OK, serde_json::to_value(&body)?))
}
