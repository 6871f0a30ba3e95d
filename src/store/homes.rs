//! Home Store
//!
//! Homes of the signed-in identity, newest first, plus the "ensure default"
//! resolver that finds or creates the identity's home.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::collection::{CacheState, CollectionCache, PendingWrite};
use super::session::SessionStore;
use crate::domain::{from_document, DomainError, DomainResult, Entity, Home, HomePatch, SortOrder};
use crate::lock;
use crate::repository::{DocumentStore, Query};

pub const DEFAULT_HOME_NAME: &str = "My Home";

pub struct HomeStore {
    cache: CollectionCache<Home>,
    default_name: String,
    /// (uid, home id) resolved by `ensure_home`
    ensured: Mutex<Option<(String, String)>>,
}

impl HomeStore {
    pub fn new(remote: Arc<dyn DocumentStore>, session: Arc<SessionStore>) -> Self {
        Self::with_default_name(remote, session, DEFAULT_HOME_NAME)
    }

    pub fn with_default_name(
        remote: Arc<dyn DocumentStore>,
        session: Arc<SessionStore>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            cache: CollectionCache::new(remote, session),
            default_name: default_name.into(),
            ensured: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &CollectionCache<Home> {
        &self.cache
    }

    pub fn homes(&self) -> Vec<Home> {
        self.cache.items()
    }

    pub fn current_home(&self) -> Option<Home> {
        self.cache.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState<Home>> {
        self.cache.subscribe()
    }

    pub async fn fetch_homes(&self) {
        self.cache.fetch(None).await;
    }

    pub fn create_home(&self, name: impl Into<String>) -> DomainResult<(Home, PendingWrite)> {
        let name = name.into();
        self.cache.create(|record| Home::new(record, name))
    }

    pub fn rename_home(&self, home_id: &str, name: impl Into<String>) -> DomainResult<PendingWrite> {
        self.cache.update(home_id, HomePatch::rename(name))
    }

    pub fn delete_home(&self, home_id: &str) -> DomainResult<PendingWrite> {
        let write = self.cache.delete(home_id)?;
        let mut ensured = lock(&self.ensured);
        if ensured.as_ref().is_some_and(|(_, id)| id == home_id) {
            *ensured = None;
        }
        Ok(write)
    }

    pub async fn select_home(&self, home_id: &str) -> Option<Home> {
        self.cache.select(home_id).await
    }

    /// Resolve the identity's home, creating one under the default name
    /// when none exists. A resolved id is remembered per identity and
    /// returned without a network call afterwards.
    ///
    /// Overlapping first calls are not coordinated: each may find no home
    /// and create one.
    pub async fn ensure_home(&self) -> DomainResult<String> {
        let uid = self.cache.session().uid().ok_or(DomainError::NotSignedIn)?;
        if let Some((owner, home_id)) = lock(&self.ensured).as_ref() {
            if *owner == uid {
                return Ok(home_id.clone());
            }
        }

        let query = Query::new()
            .where_eq("ownerId", uid.as_str())
            .order_by("createdAt", SortOrder::Ascending)
            .limit(1);
        let existing = match self.cache.remote().query(Home::COLLECTION, &query).await {
            Ok(mut snaps) => snaps.pop(),
            Err(e) => {
                log::warn!("Looking up default home failed: {}", e);
                self.cache.set_error(e.to_string());
                return Err(e);
            }
        };

        let home_id = match existing {
            Some(snap) => {
                let home: Home = from_document(&snap.id, snap.data)?;
                home.id
            }
            None => {
                log::info!("No home found for {}, creating \"{}\"", uid, self.default_name);
                let (home, write) = self.create_home(self.default_name.clone())?;
                write.settled().await;
                home.id
            }
        };

        *lock(&self.ensured) = Some((uid, home_id.clone()));
        Ok(home_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryDocumentStore, Operation};
    use crate::test_support::{seed_home, session_for, signed_out_session};

    #[tokio::test]
    async fn test_create_home_scenario() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = HomeStore::new(remote.clone(), session_for("u1").await);

        let (_, write) = store.create_home("Lake House").unwrap();

        let first = &store.homes()[0];
        assert_eq!(first.name, "Lake House");
        assert_eq!(first.owner_id, "u1");
        assert!(!first.id.is_empty());
        assert!(!write.is_finished());
        assert!(remote.is_empty("homes"));
    }

    #[tokio::test]
    async fn test_fetch_homes_newest_first() {
        let remote = Arc::new(MemoryDocumentStore::new());
        seed_home(&remote, "old", "u1", "Old", 1_000);
        seed_home(&remote, "new", "u1", "New", 3_000);
        seed_home(&remote, "mid", "u1", "Mid", 2_000);
        let store = HomeStore::new(remote.clone(), session_for("u1").await);

        store.fetch_homes().await;
        let ids: Vec<String> = store.homes().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_ensure_home_creates_once() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = HomeStore::new(remote.clone(), session_for("u1").await);

        let first = store.ensure_home().await.unwrap();
        let second = store.ensure_home().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(remote.len("homes"), 1);
        assert_eq!(remote.document("homes", &first).unwrap()["name"], DEFAULT_HOME_NAME);
    }

    #[tokio::test]
    async fn test_ensure_home_reuses_existing() {
        let remote = Arc::new(MemoryDocumentStore::new());
        seed_home(&remote, "h1", "u1", "Lake House", 1_000);
        seed_home(&remote, "h2", "u1", "Cabin", 2_000);
        seed_home(&remote, "x", "u2", "Not mine", 500);
        let store = HomeStore::new(remote.clone(), session_for("u1").await);

        assert_eq!(store.ensure_home().await.unwrap(), "h1");
        remote.clear_operations();
        assert_eq!(store.ensure_home().await.unwrap(), "h1");
        assert!(remote.operations().is_empty());
        assert_eq!(remote.len("homes"), 3);
    }

    #[tokio::test]
    async fn test_ensure_home_uses_configured_name() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = HomeStore::with_default_name(remote.clone(), session_for("u1").await, "Base");
        let id = store.ensure_home().await.unwrap();
        assert_eq!(remote.document("homes", &id).unwrap()["name"], "Base");
    }

    #[tokio::test]
    async fn test_ensure_home_requires_identity() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = HomeStore::new(remote.clone(), signed_out_session().await);
        assert_eq!(store.ensure_home().await, Err(DomainError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_ensure_home_surfaces_lookup_failure() {
        let remote = Arc::new(MemoryDocumentStore::new());
        remote.set_offline(true);
        let store = HomeStore::new(remote.clone(), session_for("u1").await);
        assert!(store.ensure_home().await.is_err());
        assert_eq!(store.cache().error().as_deref(), Some("Network unavailable"));
        assert!(store.homes().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_ensured_home_forgets_it() {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = HomeStore::new(remote.clone(), session_for("u1").await);
        let first = store.ensure_home().await.unwrap();

        store.delete_home(&first).unwrap().settled().await;
        let second = store.ensure_home().await.unwrap();
        assert_ne!(first, second);
        assert!(remote
            .operations()
            .contains(&Operation::Delete { collection: "homes".into(), id: first }));
    }

    #[tokio::test]
    async fn test_rename_updates_local_and_remote() {
        let remote = Arc::new(MemoryDocumentStore::new());
        seed_home(&remote, "h1", "u1", "Lake House", 1_000);
        let store = HomeStore::new(remote.clone(), session_for("u1").await);
        store.fetch_homes().await;
        store.select_home("h1").await;

        let write = store.rename_home("h1", "Cabin").unwrap();
        assert_eq!(store.homes()[0].name, "Cabin");
        assert_eq!(store.current_home().unwrap().name, "Cabin");
        write.settled().await;
        assert_eq!(remote.document("homes", "h1").unwrap()["name"], "Cabin");
    }
}
