//! Domain Layer - Core Entity Trait
//!
//! Every remotely persisted entity lives in one named collection, is owned
//! by exactly one identity, and is ordered by its creation time.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Schemaless document body as stored remotely
pub type Document = Map<String, Value>;

/// Sort direction of a collection query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Attributes every new entity receives from the cache that creates it
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Locally generated document id
    pub id: String,
    /// Identity creating the entity
    pub owner_id: String,
    /// Local creation time, used for both timestamps
    pub now: DateTime<Utc>,
}

/// Core trait for all remotely persisted entities
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Remote collection name
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages
    const LABEL: &'static str;
    /// Order in which the remote query returns the collection
    const ORDER: SortOrder;
    /// Field holding the parent id, if the entity is scoped under one
    const PARENT_FIELD: Option<&'static str>;

    /// Partial update applied locally and sent remotely
    type Patch: Serialize + Clone + Send + Sync + 'static;

    fn id(&self) -> &str;

    fn owner_id(&self) -> &str;

    /// Merge a partial update in place
    fn apply(&mut self, patch: &Self::Patch);

    /// Stamp `updatedAt`
    fn touch(&mut self, now: DateTime<Utc>);
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Remote(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

/// Serialize an entity into a document body; the id is the document key
/// and is not stored in the body.
pub fn to_document<E: Entity>(entity: &E) -> DomainResult<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(DomainError::Serialization(format!(
            "{} serialized to a non-object value: {other}",
            E::LABEL
        ))),
    }
}

/// Rebuild an entity from a document key and body
pub fn from_document<E: Entity>(id: &str, mut data: Document) -> DomainResult<E> {
    data.insert("id".to_string(), Value::String(id.to_string()));
    Ok(serde_json::from_value(Value::Object(data))?)
}

/// Serialize a patch and stamp it with `updatedAt`
pub fn patch_document<P: Serialize>(patch: &P, now: DateTime<Utc>) -> DomainResult<Document> {
    let mut map = match serde_json::to_value(patch)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(DomainError::Serialization(format!(
                "patch serialized to a non-object value: {other}"
            )))
        }
    };
    map.insert("updatedAt".to_string(), Value::from(now.timestamp_millis()));
    Ok(map)
}
