pub mod create;
pub mod delete;
pub mod health;
pub mod list;
pub mod read;
pub mod update;

pub use create::create_article_handler;
pub use delete::delete_article_handler;
pub use health::health_handler;
pub use list::read_articles_handler;
pub use read::read_article_handler;
pub use update::update_article_handler;

use axum::http::StatusCode;
use serde_json::Value as JsonValue;

use crate::envelope::Envelope;
use crate::error::ApiError;

/// Fallback for any (method, path) pair outside the route table, including
/// known paths hit with the wrong method.
pub async fn not_found_handler() -> Envelope {
    Envelope::json(
        StatusCode::NOT_FOUND,
        JsonValue::String("Not Found".to_string()),
    )
}

/// Pull a required non-empty string field out of a request payload.
pub(crate) fn required_str(payload: &JsonValue, field: &'static str) -> Result<String, ApiError> {
    match payload.get(field) {
        None => Err(ApiError::MissingField(field)),
        Some(JsonValue::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(ApiError::InvalidField(field)),
    }
}
