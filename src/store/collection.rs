//! Optimistic Collection Cache
//!
//! One building block behind the home, room and item stores. Holds the
//! owner's slice of a remote collection in memory, ordered the way the
//! remote query returned it. Writes change the local sequence first and
//! then run in a spawned task; a failed write only sets the error message
//! and is never rolled back, so the local sequence can differ from the
//! remote store until the next `fetch`.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{from_document, patch_document, to_document, DomainError, DomainResult, Entity, NewRecord};
use crate::repository::{DocumentSnapshot, DocumentStore, Query};
use crate::store::SessionStore;

/// Observable state of one collection cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheState<E> {
    /// Local mirror of the scoped remote collection
    pub items: Vec<E>,
    /// Entity resolved by the last `select`
    pub current: Option<E>,
    pub loading: bool,
    /// Last error message; a newer error overwrites it
    pub error: Option<String>,
}

impl<E> Default for CacheState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
        }
    }
}

/// Handle to a remote write running in the background. Dropping it leaves
/// the write running; awaiting `settled` waits for it to finish.
#[derive(Debug)]
pub struct PendingWrite {
    handle: JoinHandle<()>,
}

impl PendingWrite {
    pub async fn settled(self) {
        if let Err(e) = self.handle.await {
            log::error!("Background write task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Timestamps are kept at the millisecond precision they are stored with
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub struct CollectionCache<E: Entity> {
    remote: Arc<dyn DocumentStore>,
    session: Arc<SessionStore>,
    state: Arc<watch::Sender<CacheState<E>>>,
}

impl<E: Entity> Clone for CollectionCache<E> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            session: Arc::clone(&self.session),
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Entity> CollectionCache<E> {
    pub fn new(remote: Arc<dyn DocumentStore>, session: Arc<SessionStore>) -> Self {
        Self {
            remote,
            session,
            state: Arc::new(watch::channel(CacheState::default()).0),
        }
    }

    // ========================
    // State accessors
    // ========================

    pub fn snapshot(&self) -> CacheState<E> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<E> {
        self.state.borrow().items.clone()
    }

    pub fn current(&self) -> Option<E> {
        self.state.borrow().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn find(&self, id: &str) -> Option<E> {
        self.state.borrow().items.iter().find(|e| e.id() == id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState<E>> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    pub(crate) fn session(&self) -> &SessionStore {
        &self.session
    }

    pub(crate) fn remote(&self) -> &Arc<dyn DocumentStore> {
        &self.remote
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error = Some(message));
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, loading) != loading);
    }

    // ========================
    // Reads
    // ========================

    /// Query the owner's collection, narrowed to `parent_id` when the entity
    /// is scoped under a parent
    pub fn scoped_query(&self, owner_id: &str, parent_id: Option<&str>) -> Query {
        let mut query = Query::new().where_eq("ownerId", owner_id);
        if let (Some(field), Some(parent_id)) = (E::PARENT_FIELD, parent_id) {
            query = query.where_eq(field, parent_id);
        }
        query.order_by("createdAt", E::ORDER)
    }

    /// Replace the local sequence with the scoped remote collection.
    /// Without an identity this does nothing; on failure the previous
    /// sequence is kept and the error message is set.
    pub async fn fetch(&self, parent_id: Option<&str>) {
        let Some(owner_id) = self.session.uid() else {
            return;
        };
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let query = self.scoped_query(&owner_id, parent_id);
        let result = self
            .remote
            .query(E::COLLECTION, &query)
            .await
            .and_then(decode_all::<E>);

        match result {
            Ok(items) => {
                log::debug!("Fetched {} {} document(s)", items.len(), E::COLLECTION);
                self.state.send_modify(|s| {
                    s.items = items;
                    s.loading = false;
                });
            }
            Err(e) => {
                log::warn!("Fetching {} failed: {}", E::COLLECTION, e);
                self.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                });
            }
        }
    }

    /// Resolve an entity by id into `current`. A cached entity is used
    /// without touching the network; otherwise it is read remotely. Without
    /// a signed-in identity nothing is read, and a document owned by
    /// someone else counts as not found.
    pub async fn select(&self, id: &str) -> Option<E> {
        if let Some(found) = self.find(id) {
            self.state.send_modify(|s| s.current = Some(found.clone()));
            return Some(found);
        }
        let uid = self.session.uid()?;

        self.set_loading(true);
        let result = self
            .remote
            .get(E::COLLECTION, id)
            .await
            .and_then(|snap| snap.map(decode::<E>).transpose())
            .map(|found| found.filter(|entity| entity.owner_id() == uid));

        let mut selected = None;
        self.state.send_modify(|s| {
            match result {
                Ok(Some(entity)) => {
                    s.current = Some(entity.clone());
                    selected = Some(entity);
                }
                Ok(None) => {
                    s.error = Some(DomainError::NotFound(E::LABEL.to_string()).to_string());
                    s.current = None;
                }
                Err(e) => {
                    log::warn!("Reading {}/{} failed: {}", E::COLLECTION, id, e);
                    s.error = Some(e.to_string());
                }
            }
            s.loading = false;
        });
        selected
    }

    // ========================
    // Optimistic writes
    // ========================

    /// Build a new entity with a locally generated id, put it first in the
    /// local sequence and write it in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create(&self, build: impl FnOnce(NewRecord) -> E) -> DomainResult<(E, PendingWrite)> {
        let owner_id = self.session.uid().ok_or(DomainError::NotSignedIn)?;
        let record = NewRecord {
            id: self.remote.generate_id(E::COLLECTION),
            owner_id,
            now: now(),
        };
        let entity = build(record);
        let document = to_document(&entity)?;

        self.state.send_modify(|s| s.items.insert(0, entity.clone()));
        log::debug!("Optimistically created {}/{}", E::COLLECTION, entity.id());

        let remote = Arc::clone(&self.remote);
        let id = entity.id().to_string();
        let write = self.spawn_write("create", async move {
            remote.set(E::COLLECTION, &id, document).await
        });
        Ok((entity, write))
    }

    /// Merge `patch` into the cached entity (if present) and send it
    /// remotely either way.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn update(&self, id: &str, patch: E::Patch) -> DomainResult<PendingWrite> {
        self.session.uid().ok_or(DomainError::NotSignedIn)?;
        let now = now();
        let document = patch_document(&patch, now)?;

        self.state.send_if_modified(|s| {
            let mut changed = false;
            for entity in s.items.iter_mut().chain(s.current.iter_mut()) {
                if entity.id() == id {
                    entity.apply(&patch);
                    entity.touch(now);
                    changed = true;
                }
            }
            changed
        });
        log::debug!("Optimistically updated {}/{}", E::COLLECTION, id);

        let remote = Arc::clone(&self.remote);
        let id = id.to_string();
        Ok(self.spawn_write("update", async move {
            remote.update(E::COLLECTION, &id, document).await
        }))
    }

    /// Drop the entity from the local sequence (if present) and delete it
    /// remotely either way.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn delete(&self, id: &str) -> DomainResult<PendingWrite> {
        self.session.uid().ok_or(DomainError::NotSignedIn)?;

        self.state.send_if_modified(|s| {
            let before = s.items.len();
            s.items.retain(|e| e.id() != id);
            let cleared = s.current.as_ref().is_some_and(|e| e.id() == id);
            if cleared {
                s.current = None;
            }
            cleared || s.items.len() != before
        });
        log::debug!("Optimistically deleted {}/{}", E::COLLECTION, id);

        let remote = Arc::clone(&self.remote);
        let id = id.to_string();
        Ok(self.spawn_write("delete", async move {
            remote.delete(E::COLLECTION, &id).await
        }))
    }

    /// Run a remote write detached from the caller. Its only visible effect
    /// on failure is the cache error message.
    fn spawn_write(
        &self,
        verb: &'static str,
        write: impl std::future::Future<Output = DomainResult<()>> + Send + 'static,
    ) -> PendingWrite {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            if let Err(e) = write.await {
                log::error!("Failed to {} {}: {}", verb, E::LABEL.to_lowercase(), e);
                let message = format!("Failed to {} {}", verb, E::LABEL.to_lowercase());
                state.send_modify(|s| s.error = Some(message));
            }
        });
        PendingWrite { handle }
    }
}

fn decode<E: Entity>(snap: DocumentSnapshot) -> DomainResult<E> {
    from_document(&snap.id, snap.data)
}

fn decode_all<E: Entity>(snaps: Vec<DocumentSnapshot>) -> DomainResult<Vec<E>> {
    snaps.into_iter().map(decode::<E>).collect()
}
