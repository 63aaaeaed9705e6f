use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Query parameters for the read-one endpoint.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReadArticleQuery {
    #[serde(rename = "articleId")]
    pub article_id: Option<String>,
}

/// Response body for a successful create.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SaveResponse {
    pub operation: String,
    pub message: String,
    pub item: JsonValue,
}

/// Response body for a successful single-field update.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateResponse {
    pub operation: String,
    pub message: String,
    pub update_attributes: JsonValue,
}

/// Response body for a successful delete.
///
/// `DeleteItem` carries the prior record and is omitted when the key did
/// not exist.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteResponse {
    pub operation: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_item: Option<JsonValue>,
}

/// Response body for the read-all endpoint.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ArticlesResponse {
    pub articles: Vec<JsonValue>,
}
