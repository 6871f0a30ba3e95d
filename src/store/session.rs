//! Session Store
//!
//! Mirrors the identity provider's view of who is signed in. Not ready
//! until the provider's first notification arrives; after that, later
//! notifications only replace the identity.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{DomainResult, Identity};
use crate::lock;
use crate::repository::IdentityProvider;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub ready: bool,
}

impl SessionState {
    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.uid.as_str())
    }

    pub fn is_authed(&self) -> bool {
        self.identity.is_some()
    }
}

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(watch::channel(SessionState::default()).0),
            listener: Mutex::new(None),
        }
    }

    /// Subscribe to the identity provider. Calling it again is a no-op.
    /// Must be called from within a Tokio runtime.
    pub fn init(&self) {
        let mut listener = lock(&self.listener);
        if listener.is_some() {
            return;
        }
        let mut notifications = self.provider.subscribe();
        let state = Arc::clone(&self.state);
        *listener = Some(tokio::spawn(async move {
            while let Some(identity) = notifications.recv().await {
                let uid = identity.as_ref().map(|i| i.uid.clone());
                let became_ready = !state.borrow().ready;
                state.send_modify(|s| {
                    s.identity = identity;
                    s.ready = true;
                });
                if became_ready {
                    log::info!("Session ready (uid: {:?})", uid);
                } else {
                    log::debug!("Session identity changed (uid: {:?})", uid);
                }
            }
        }));
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn uid(&self) -> Option<String> {
        self.state.borrow().uid().map(str::to_string)
    }

    pub fn is_authed(&self) -> bool {
        self.state.borrow().is_authed()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve once the provider's first notification has been observed
    pub async fn wait_ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail while we wait
        let _ = rx.wait_for(|s| s.ready).await;
    }

    /// Sign out through the provider; the cached identity clears when its
    /// notification arrives.
    pub async fn logout(&self) -> DomainResult<()> {
        self.provider.sign_out().await
    }

    pub(crate) fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryIdentityProvider;

    #[tokio::test]
    async fn test_not_ready_until_first_notification() {
        let session = SessionStore::new(Arc::new(MemoryIdentityProvider::new()));
        assert!(!session.is_ready());

        session.init();
        session.wait_ready().await;
        assert!(session.is_ready());
        assert!(!session.is_authed());
        assert_eq!(session.uid(), None);
    }

    #[tokio::test]
    async fn test_ready_with_existing_identity() {
        let provider = MemoryIdentityProvider::signed_in(Identity::new("u1"));
        let session = SessionStore::new(Arc::new(provider));
        session.init();
        session.wait_ready().await;
        assert_eq!(session.uid().as_deref(), Some("u1"));
        assert!(session.is_authed());
    }

    #[tokio::test]
    async fn test_logout_clears_identity_through_notification() {
        let provider = Arc::new(MemoryIdentityProvider::signed_in(Identity::new("u1")));
        let session = SessionStore::new(provider.clone());
        session.init();
        session.wait_ready().await;

        let mut rx = session.subscribe();
        session.logout().await.unwrap();
        rx.wait_for(|s| !s.is_authed()).await.unwrap();
        assert!(session.is_ready());
        assert_eq!(session.identity(), None);
    }

    #[tokio::test]
    async fn test_init_twice_subscribes_once() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let session = SessionStore::new(provider.clone());
        session.init();
        session.init();
        session.wait_ready().await;

        let mut rx = session.subscribe();
        provider.create_account("a@b.c", "secret1").await.unwrap();
        rx.wait_for(|s| s.is_authed()).await.unwrap();
        assert!(session.uid().is_some());
    }
}
