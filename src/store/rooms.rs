//! Room Store
//!
//! Rooms of one home, oldest first.

use std::sync::Arc;

use tokio::sync::watch;

use super::collection::{CacheState, CollectionCache, PendingWrite};
use super::session::SessionStore;
use crate::domain::{DomainResult, Room, RoomPatch};
use crate::repository::DocumentStore;

pub struct RoomStore {
    cache: CollectionCache<Room>,
}

impl RoomStore {
    pub fn new(remote: Arc<dyn DocumentStore>, session: Arc<SessionStore>) -> Self {
        Self {
            cache: CollectionCache::new(remote, session),
        }
    }

    pub fn cache(&self) -> &CollectionCache<Room> {
        &self.cache
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.cache.items()
    }

    pub fn current_room(&self) -> Option<Room> {
        self.cache.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState<Room>> {
        self.cache.subscribe()
    }

    pub async fn fetch_rooms(&self, home_id: &str) {
        self.cache.fetch(Some(home_id)).await;
    }

    pub fn create_room(&self, home_id: impl Into<String>, name: impl Into<String>) -> DomainResult<(Room, PendingWrite)> {
        let (home_id, name) = (home_id.into(), name.into());
        self.cache.create(|record| Room::new(record, home_id, name))
    }

    pub fn rename_room(&self, room_id: &str, name: impl Into<String>) -> DomainResult<PendingWrite> {
        self.cache.update(room_id, RoomPatch::rename(name))
    }

    pub fn delete_room(&self, room_id: &str) -> DomainResult<PendingWrite> {
        self.cache.delete(room_id)
    }

    pub async fn select_room(&self, room_id: &str) -> Option<Room> {
        self.cache.select(room_id).await
    }
}
