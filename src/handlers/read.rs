use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::envelope::Envelope;
use crate::error::{ApiError, ErrorMessage};
use crate::models::ReadArticleQuery;
use crate::routes;
use crate::state::AppState;

/// GET /article?articleId=<id> - read a single article.
#[utoipa::path(
    get,
    path = routes::ARTICLE,
    params(
        ("articleId" = String, Query, description = "Key of the article to read")
    ),
    responses(
        (status = 200, description = "The stored article", body = serde_json::Value),
        (status = 400, description = "Missing or invalid articleId", body = ErrorMessage),
        (status = 404, description = "No article under that key", body = ErrorMessage),
        (status = 500, description = "Storage error", body = ErrorMessage)
    ),
    tag = "articles"
)]
pub async fn read_article_handler(
    State(state): State<AppState>,
    Query(query): Query<ReadArticleQuery>,
) -> Result<Envelope, ApiError> {
    let article_id = query
        .article_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingField("articleId"))?;

    match state.store.get(&article_id).await? {
        Some(article) => {
            tracing::info!("Read article {article_id}");
            Ok(Envelope::json(StatusCode::OK, article.to_plain_json()?))
        }
        None => Err(ApiError::NotFound(article_id)),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::state::AppState;
    use crate::store::ArticleStore;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value as JsonValue, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn try_app() -> Option<Router> {
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        let config = Config {
            spanner_emulator_host: Some("localhost:9010".to_string()),
            spanner_project: "test-project".to_string(),
            spanner_instance: "read-endpoint-test".to_string(),
            spanner_database: "read-endpoint-test-db".to_string(),
            service_host: "0.0.0.0".to_string(),
            service_port: 3000,
        };

        let store = match ArticleStore::from_config(&config).await {
            Ok(store) => store,
            Err(err) => {
                println!("skipping, Spanner emulator not reachable: {err:#}");
                return None;
            }
        };

        Some(crate::routes::router(AppState {
            store,
            config: Arc::new(config),
        }))
    }

    async fn body_json(response: axum::response::Response) -> JsonValue {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_read_returns_stored_record() {
        let Some(app) = try_app().await else { return };

        let payload = json!({"articleId": "a1", "title": "x", "price": 9.99, "stock": 7});
        let create = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/article")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/article?articleId=a1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, payload);
    }

    #[tokio::test]
    async fn test_read_unknown_id_is_404() {
        let Some(app) = try_app().await else { return };

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/article?articleId=missing-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"Message": "ArticleId: missing-1 not found"})
        );
    }

    #[tokio::test]
    async fn test_read_without_article_id_is_400() {
        let Some(app) = try_app().await else { return };

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/article")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"Message": "Missing required field: articleId"})
        );
    }
}
