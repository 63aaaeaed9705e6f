use axum::http::StatusCode;

use crate::envelope::Envelope;
use crate::routes;

/// GET /health - liveness probe.
///
/// Returns the success envelope with no body; the fixed headers are still
/// attached.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service is up, empty body")
    ),
    tag = "health"
)]
pub async fn health_handler() -> Envelope {
    Envelope::empty(StatusCode::OK)
}
