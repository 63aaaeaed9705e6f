use utoipa::OpenApi;

use crate::error::ErrorMessage;
use crate::handlers;
use crate::models::{ArticlesResponse, DeleteResponse, SaveResponse, UpdateResponse};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "articles-api",
        version = "1.0.0",
        description = "Article inventory CRUD service backed by Google Cloud Spanner"
    ),
    paths(
        handlers::health::health_handler,
        handlers::read::read_article_handler,
        handlers::list::read_articles_handler,
        handlers::create::create_article_handler,
        handlers::update::update_article_handler,
        handlers::delete::delete_article_handler
    ),
    components(
        schemas(
            SaveResponse,
            UpdateResponse,
            DeleteResponse,
            ArticlesResponse,
            ErrorMessage
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "articles", description = "Article record operations")
    )
)]
pub struct ApiDoc;
