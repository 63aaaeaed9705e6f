use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value as JsonValue;

/// Uniform response wrapper returned by every handler.
///
/// Carries a status code, the two fixed headers, and an optional JSON body.
/// When no body was passed the HTTP body is omitted entirely, not sent as
/// an empty object.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub body: Option<JsonValue>,
}

impl Envelope {
    pub fn empty(status: StatusCode) -> Self {
        Envelope { status, body: None }
    }

    pub fn json(status: StatusCode, body: JsonValue) -> Self {
        Envelope {
            status,
            body: Some(body),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let headers = [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ];
        match self.body {
            Some(value) => (self.status, headers, value.to_string()).into_response(),
            None => (self.status, headers).into_response(),
        }
    }
}
