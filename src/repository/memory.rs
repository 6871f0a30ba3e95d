//! In-memory document store
//!
//! Stands in for the remote store in tests and local runs. Keeps documents
//! in insertion order, sorts stably on query, and records every operation
//! that reached it, including ones failed by the offline switch.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{DocumentSnapshot, DocumentStore, Query};
use crate::domain::{Document, DomainError, DomainResult, SortOrder};
use crate::lock;

/// One call received by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Query { collection: String },
    Get { collection: String, id: String },
    Add { collection: String, id: String },
    Set { collection: String, id: String },
    Update { collection: String, id: String },
    Delete { collection: String, id: String },
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<(String, Document)>>>,
    operations: Mutex<Vec<Operation>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Insert a document directly, bypassing the operation log
    pub fn seed(&self, collection: &str, id: &str, data: Document) {
        upsert(&mut lock(&self.collections), collection, id, data);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.collections)
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, data)| data.clone())
    }

    pub fn len(&self, collection: &str) -> usize {
        lock(&self.collections).get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Every call received so far, oldest first
    pub fn operations(&self) -> Vec<Operation> {
        lock(&self.operations).clone()
    }

    pub fn clear_operations(&self) {
        lock(&self.operations).clear();
    }

    fn record(&self, op: Operation) -> DomainResult<()> {
        lock(&self.operations).push(op);
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(DomainError::Remote("Network unavailable".to_string()));
        }
        Ok(())
    }
}

fn upsert(collections: &mut HashMap<String, Vec<(String, Document)>>, collection: &str, id: &str, data: Document) {
    let docs = collections.entry(collection.to_string()).or_default();
    match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
        Some((_, existing)) => *existing = data,
        None => docs.push((id.to_string(), data)),
    }
}

/// Order missing fields first, then numbers, then strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, collection: &str, query: &Query) -> DomainResult<Vec<DocumentSnapshot>> {
        self.record(Operation::Query {
            collection: collection.to_string(),
        })?;

        let collections = lock(&self.collections);
        let mut hits: Vec<DocumentSnapshot> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| DocumentSnapshot {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &query.order_by {
            hits.sort_by(|a, b| {
                let ord = compare_values(a.data.get(field), b.data.get(field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<DocumentSnapshot>> {
        self.record(Operation::Get {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        Ok(self.document(collection, id).map(|data| DocumentSnapshot {
            id: id.to_string(),
            data,
        }))
    }

    async fn add(&self, collection: &str, data: Document) -> DomainResult<String> {
        let id = self.generate_id(collection);
        self.record(Operation::Add {
            collection: collection.to_string(),
            id: id.clone(),
        })?;
        upsert(&mut lock(&self.collections), collection, &id, data);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> DomainResult<()> {
        self.record(Operation::Set {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        upsert(&mut lock(&self.collections), collection, id, data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> DomainResult<()> {
        self.record(Operation::Update {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        let mut collections = lock(&self.collections);
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .map(|(_, data)| data)
            .ok_or_else(|| DomainError::NotFound(format!("Document {collection}/{id}")))?;
        existing.extend(patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DomainResult<()> {
        self.record(Operation::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        if let Some(docs) = lock(&self.collections).get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}
