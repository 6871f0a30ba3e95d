//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::domain::{to_document, Home, Identity, Item, NewItem, NewRecord, Room};
use crate::repository::{MemoryDocumentStore, MemoryIdentityProvider};
use crate::store::SessionStore;

/// A ready session signed in as `uid`
pub async fn session_for(uid: &str) -> Arc<SessionStore> {
    let provider = MemoryIdentityProvider::signed_in(Identity::new(uid));
    let session = Arc::new(SessionStore::new(Arc::new(provider)));
    session.init();
    session.wait_ready().await;
    session
}

/// A ready session with nobody signed in
pub async fn signed_out_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryIdentityProvider::new())));
    session.init();
    session.wait_ready().await;
    session
}

fn record(id: &str, owner_id: &str, created_ms: i64) -> NewRecord {
    NewRecord {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        now: Utc.timestamp_millis_opt(created_ms).unwrap(),
    }
}

pub fn seed_home(store: &MemoryDocumentStore, id: &str, owner_id: &str, name: &str, created_ms: i64) -> Home {
    let home = Home::new(record(id, owner_id, created_ms), name.to_string());
    store.seed("homes", id, to_document(&home).unwrap());
    home
}

pub fn seed_room(
    store: &MemoryDocumentStore,
    id: &str,
    owner_id: &str,
    home_id: &str,
    name: &str,
    created_ms: i64,
) -> Room {
    let room = Room::new(record(id, owner_id, created_ms), home_id.to_string(), name.to_string());
    store.seed("rooms", id, to_document(&room).unwrap());
    room
}

pub fn seed_item(store: &MemoryDocumentStore, id: &str, owner_id: &str, room_id: &str, title: &str, created_ms: i64) -> Item {
    let item = Item::new(record(id, owner_id, created_ms), NewItem::new("h1", room_id, title));
    store.seed("items", id, to_document(&item).unwrap());
    item
}

/// A document that does not decode as any entity
pub fn seed_garbage(store: &MemoryDocumentStore, collection: &str, id: &str, owner_id: &str) {
    let data = json!({"ownerId": owner_id, "createdAt": "yesterday"});
    store.seed(collection, id, data.as_object().cloned().unwrap());
}
