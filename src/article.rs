use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// Tagged attribute value, mirroring the storage backend's native encoding.
///
/// Numbers are carried as decimal strings (`N`) end to end and only become
/// JSON numbers when a record is rendered into a response body. Everything
/// else round-trips structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    S(String),
    N(String),
    Bool(bool),
    Null,
    L(Vec<AttrValue>),
    M(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Convert an untyped request value into the tagged form.
    pub fn from_json(value: &JsonValue) -> AttrValue {
        match value {
            JsonValue::Null => AttrValue::Null,
            JsonValue::Bool(b) => AttrValue::Bool(*b),
            JsonValue::Number(n) => AttrValue::N(n.to_string()),
            JsonValue::String(s) => AttrValue::S(s.clone()),
            JsonValue::Array(items) => {
                AttrValue::L(items.iter().map(AttrValue::from_json).collect())
            }
            JsonValue::Object(map) => AttrValue::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), AttrValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the tagged value as plain JSON for a response body.
    ///
    /// Decimal strings become an integer when the value is integral and a
    /// float otherwise. Non-finite values cannot be represented in JSON and
    /// are an error.
    pub fn to_plain(&self) -> Result<JsonValue> {
        match self {
            AttrValue::S(s) => Ok(JsonValue::String(s.clone())),
            AttrValue::N(raw) => plain_number(raw),
            AttrValue::Bool(b) => Ok(JsonValue::Bool(*b)),
            AttrValue::Null => Ok(JsonValue::Null),
            AttrValue::L(items) => Ok(JsonValue::Array(
                items
                    .iter()
                    .map(AttrValue::to_plain)
                    .collect::<Result<Vec<_>>>()?,
            )),
            AttrValue::M(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_plain()?);
                }
                Ok(JsonValue::Object(out))
            }
        }
    }
}

fn plain_number(raw: &str) -> Result<JsonValue> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(JsonValue::Number(i.into()));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(JsonValue::Number(u.into()));
    }
    let f: f64 = raw
        .parse()
        .with_context(|| format!("invalid numeric attribute: {raw}"))?;
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| anyhow!("numeric attribute is not a finite number: {raw}"))
}

/// A single article record: the storage key plus the open attribute set.
///
/// The attribute map always contains `articleId` as well, so a stored record
/// reads back verbatim as it was created.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    id: String,
    fields: BTreeMap<String, AttrValue>,
}

impl Article {
    /// Build an article from an inbound request payload.
    ///
    /// The payload must be a JSON object carrying a non-empty string
    /// `articleId`; the rest of the fields are taken as-is.
    pub fn from_json(payload: &JsonValue) -> Result<Self, ApiError> {
        let Some(map) = payload.as_object() else {
            return Err(ApiError::InvalidBody(
                "request body must be a JSON object".to_string(),
            ));
        };
        let id = match map.get("articleId") {
            None => return Err(ApiError::MissingField("articleId")),
            Some(JsonValue::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => return Err(ApiError::InvalidField("articleId")),
        };
        let fields = map
            .iter()
            .map(|(k, v)| (k.clone(), AttrValue::from_json(v)))
            .collect();
        Ok(Article { id, fields })
    }

    /// Rehydrate an article from a storage row.
    pub fn from_stored(id: String, attrs_json: &str) -> Result<Self> {
        let fields: BTreeMap<String, AttrValue> = serde_json::from_str(attrs_json)
            .with_context(|| format!("corrupt attribute column for article {id}"))?;
        Ok(Article { id, fields })
    }

    pub fn article_id(&self) -> &str {
        &self.id
    }

    pub fn set_field(&mut self, key: &str, value: AttrValue) {
        self.fields.insert(key.to_string(), value);
    }

    /// Tagged encoding written to the storage attribute column.
    pub fn to_stored(&self) -> Result<String> {
        serde_json::to_string(&self.fields)
            .with_context(|| format!("failed to encode attributes for article {}", self.id))
    }

    /// Plain-JSON rendering for response bodies, numerics normalized.
    pub fn to_plain_json(&self) -> Result<JsonValue> {
        let mut out = serde_json::Map::new();
        for (k, v) in &self.fields {
            out.insert(k.clone(), v.to_plain()?);
        }
        Ok(JsonValue::Object(out))
    }
}
