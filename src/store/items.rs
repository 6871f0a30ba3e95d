//! Item Store
//!
//! Items of one room, newest first.

use std::sync::Arc;

use tokio::sync::watch;

use super::collection::{CacheState, CollectionCache, PendingWrite};
use super::session::SessionStore;
use crate::domain::{DomainResult, Item, ItemPatch, NewItem};
use crate::repository::DocumentStore;

pub struct ItemStore {
    cache: CollectionCache<Item>,
}

impl ItemStore {
    pub fn new(remote: Arc<dyn DocumentStore>, session: Arc<SessionStore>) -> Self {
        Self {
            cache: CollectionCache::new(remote, session),
        }
    }

    pub fn cache(&self) -> &CollectionCache<Item> {
        &self.cache
    }

    pub fn items(&self) -> Vec<Item> {
        self.cache.items()
    }

    pub fn current_item(&self) -> Option<Item> {
        self.cache.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState<Item>> {
        self.cache.subscribe()
    }

    pub async fn fetch_items(&self, room_id: &str) {
        self.cache.fetch(Some(room_id)).await;
    }

    pub fn create_item(&self, draft: NewItem) -> DomainResult<(Item, PendingWrite)> {
        self.cache.create(|record| Item::new(record, draft))
    }

    pub fn update_item(&self, item_id: &str, patch: ItemPatch) -> DomainResult<PendingWrite> {
        self.cache.update(item_id, patch)
    }

    pub fn delete_item(&self, item_id: &str) -> DomainResult<PendingWrite> {
        self.cache.delete(item_id)
    }

    pub async fn select_item(&self, item_id: &str) -> Option<Item> {
        self.cache.select(item_id).await
    }
}
