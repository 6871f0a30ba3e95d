//! Repository Layer - Core Traits
//!
//! Abstract interface to the remote document store. Documents are
//! schemaless maps; the entity shapes are imposed by the domain layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Document, DomainResult, SortOrder};

/// One document returned by a read
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Document,
}

/// Equality filter on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Filtered, ordered, optionally limited collection query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document body satisfies every filter
    pub fn matches(&self, data: &Document) -> bool {
        self.filters
            .iter()
            .all(|f| data.get(&f.field) == Some(&f.value))
    }
}

/// Remote document store
///
/// All reads and writes are async; `generate_id` is local and must not
/// require a round-trip.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Produce a fresh document id for `collection`
    fn generate_id(&self, _collection: &str) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn query(&self, collection: &str, query: &Query) -> DomainResult<Vec<DocumentSnapshot>>;

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<DocumentSnapshot>>;

    /// Create a document under a store-generated id
    async fn add(&self, collection: &str, data: Document) -> DomainResult<String>;

    /// Create or overwrite a document under an explicit id
    async fn set(&self, collection: &str, id: &str, data: Document) -> DomainResult<()>;

    /// Merge top-level fields into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Document) -> DomainResult<()>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_matches_all_filters() {
        let query = Query::new().where_eq("ownerId", "u1").where_eq("homeId", "h1");
        let hit = json!({"ownerId": "u1", "homeId": "h1", "name": "Kitchen"});
        let miss = json!({"ownerId": "u1", "homeId": "h2"});
        assert!(query.matches(hit.as_object().unwrap()));
        assert!(!query.matches(miss.as_object().unwrap()));
    }

    #[test]
    fn test_query_without_filters_matches_everything() {
        assert!(Query::new().matches(&Document::new()));
    }
}
