//! Deterministic names for per-user indices and per-collection aliases.

use serde_json::{Value, json};
use thiserror::Error;
use vocabulary_sdk::Word;

const INDEX_PREFIX: &str = "collection_words";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("user id must be positive, got {0}")]
    UserId(i64),
    #[error("collection id must be positive, got {0}")]
    CollectionId(i64),
    #[error("malformed document id {0:?}")]
    DocumentId(String),
}

/// Backing index holding every word of one user.
pub fn user_index(user_id: i64) -> Result<String, NamingError> {
    if user_id <= 0 {
        return Err(NamingError::UserId(user_id));
    }
    Ok(format!("{INDEX_PREFIX}-{user_id}"))
}

/// Filtered alias exposing one collection of a user's index.
pub fn collection_alias(user_id: i64, collection_id: i64) -> Result<String, NamingError> {
    let index = user_index(user_id)?;
    if collection_id <= 0 {
        return Err(NamingError::CollectionId(collection_id));
    }
    Ok(format!("{index}-{collection_id}"))
}

/// `/{alias}/{endpoint}/{id}` for single-document requests.
///
/// The id becomes one path segment, so anything that could be resolved as a
/// separator or dot segment is refused.
pub fn document_path(alias: &str, endpoint: &str, id: &str) -> Result<String, NamingError> {
    if !Word::is_valid_id(id) {
        return Err(NamingError::DocumentId(id.to_owned()));
    }
    Ok(format!("/{alias}/{endpoint}/{id}"))
}

/// Comma-joined index list for cross-user requests.
pub fn user_indices(user_ids: &[i64]) -> Result<String, NamingError> {
    let names = user_ids
        .iter()
        .map(|id| user_index(*id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.join(","))
}

/// Settings and mappings for a freshly created user index.
pub fn index_definition() -> Value {
    json!({
        "settings": { "number_of_shards": 1 },
        "mappings": {
            "properties": {
                "collection_id": { "type": "integer" },
                "word": {
                    "type": "text",
                    "fields": {
                        "keyword": { "type": "keyword", "ignore_above": Word::MAX_TERM_CHARS }
                    }
                },
                "translation": { "type": "text" },
                "part_of_speech": { "type": "keyword" },
                "scentance": { "type": "text" },
                "created_at": { "type": "date" }
            }
        }
    })
}

/// Alias filter restricting a user index to one collection.
pub fn alias_filter(collection_id: i64) -> Value {
    json!({ "term": { "collection_id": collection_id } })
}
