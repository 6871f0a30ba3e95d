//! Application Context
//!
//! Builds every store once at startup from the configured backends and
//! hands them out by reference.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::DomainResult;
use crate::repository::{
    ColorSchemeSource, DocumentStore, FileKeyValueStore, IdentityProvider, KeyValueStore,
    MemoryDocumentStore, MemoryIdentityProvider, MemoryKeyValueStore, StaticColorScheme,
};
use crate::router::RouteGuard;
use crate::store::{AuthStore, HomeStore, ItemStore, ModalStore, RoomStore, SessionStore, ThemeStore};

/// External collaborators the stores talk to
#[derive(Clone)]
pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub local_storage: Arc<dyn KeyValueStore>,
    pub color_scheme: Arc<dyn ColorSchemeSource>,
}

impl Backends {
    /// Everything in memory; nothing survives the process
    pub fn in_memory() -> Self {
        Self {
            identity: Arc::new(MemoryIdentityProvider::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            local_storage: Arc::new(MemoryKeyValueStore::new()),
            color_scheme: Arc::new(StaticColorScheme::default()),
        }
    }

    /// In-memory remote services with local storage on disk
    pub fn local(config: &Config) -> DomainResult<Self> {
        Ok(Self {
            local_storage: Arc::new(FileKeyValueStore::open(config.local_storage_path())?),
            ..Self::in_memory()
        })
    }
}

pub struct AppContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub auth: AuthStore,
    pub homes: HomeStore,
    pub rooms: RoomStore,
    pub items: ItemStore,
    pub theme: ThemeStore,
    pub modals: ModalStore,
    pub guard: RouteGuard,
}

impl AppContext {
    pub fn new(config: Config, backends: Backends) -> Self {
        let session = Arc::new(SessionStore::new(Arc::clone(&backends.identity)));
        Self {
            auth: AuthStore::new(Arc::clone(session.provider())),
            homes: HomeStore::with_default_name(
                Arc::clone(&backends.documents),
                Arc::clone(&session),
                config.default_home_name.clone(),
            ),
            rooms: RoomStore::new(Arc::clone(&backends.documents), Arc::clone(&session)),
            items: ItemStore::new(Arc::clone(&backends.documents), Arc::clone(&session)),
            theme: ThemeStore::new(backends.local_storage, backends.color_scheme),
            modals: ModalStore::new(),
            guard: RouteGuard::new(Arc::clone(&session)),
            session,
            config,
        }
    }

    /// Subscribe the session to the identity provider and apply the saved
    /// theme. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        log::info!("Starting {}", self.config.app_name);
        self.session.init();
        self.theme.init();
    }
}
