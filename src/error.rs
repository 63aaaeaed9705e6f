use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::envelope::Envelope;

/// Error body carried inside the response envelope.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorMessage {
    #[serde(rename = "Message")]
    pub message: String,
}

/// Typed failure for every handler code path.
///
/// Each variant maps to a well-formed envelope; nothing is swallowed and no
/// request ends without a response.
#[derive(Debug)]
pub enum ApiError {
    /// Request body was not parseable JSON, or not an object where one is
    /// required.
    InvalidBody(String),
    /// A required query parameter or payload field is absent.
    MissingField(&'static str),
    /// A required field is present but not a non-empty string.
    InvalidField(&'static str),
    /// The update targets the key attribute, which cannot change.
    ImmutableField(&'static str),
    /// No record stored under the requested articleId.
    NotFound(String),
    /// Storage backend call failed.
    Backend(anyhow::Error),
    /// A response payload failed to serialize.
    Encode(serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_)
            | ApiError::MissingField(_)
            | ApiError::InvalidField(_)
            | ApiError::ImmutableField(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Backend(_) | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidBody(detail) => format!("Invalid request body: {detail}"),
            ApiError::MissingField(field) => format!("Missing required field: {field}"),
            ApiError::InvalidField(field) => {
                format!("Field {field} must be a non-empty string")
            }
            ApiError::ImmutableField(field) => format!("Field {field} cannot be updated"),
            ApiError::NotFound(id) => format!("ArticleId: {id} not found"),
            ApiError::Backend(err) => format!("Storage error: {err:#}"),
            ApiError::Encode(err) => format!("Response encoding failed: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!("request failed: {message}");
        }
        Envelope::json(status, json!({ "Message": message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Backend(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Encode(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    async fn body_message(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorMessage = serde_json::from_slice(&bytes).unwrap();
        parsed.message
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404_with_exact_message() {
        let response = ApiError::NotFound("missing-1".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_message(response).await, "ArticleId: missing-1 not found");
    }

    #[tokio::test]
    async fn test_missing_field_maps_to_400() {
        let response = ApiError::MissingField("articleId").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_message(response).await,
            "Missing required field: articleId"
        );
    }

    #[tokio::test]
    async fn test_backend_fault_maps_to_500_envelope() {
        let response = ApiError::Backend(anyhow::anyhow!("connection reset")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(body_message(response).await.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_immutable_field_maps_to_400() {
        let response = ApiError::ImmutableField("articleId").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_message(response).await,
            "Field articleId cannot be updated"
        );
    }
}
