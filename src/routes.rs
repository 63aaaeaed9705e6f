// Route path constants - single source of truth for all API paths

use axum::Router;
use axum::routing::get;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

pub const HEALTH: &str = "/health";
pub const ARTICLE: &str = "/article";
pub const ARTICLES: &str = "/articles";

/// Wire the five (method, path) routes.
///
/// Everything outside the table falls through to the fixed 404 envelope,
/// including a known path hit with an unsupported method.
pub fn router(state: AppState) -> Router {
    // Every inbound request is logged before its handler runs
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route(HEALTH, get(handlers::health_handler))
        .route(
            ARTICLE,
            get(handlers::read_article_handler)
                .post(handlers::create_article_handler)
                .patch(handlers::update_article_handler)
                .delete(handlers::delete_article_handler),
        )
        .route(ARTICLES, get(handlers::read_articles_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found_handler)
        .method_not_allowed_fallback(handlers::not_found_handler)
        .layer(trace_layer)
        .with_state(state)
}
