//! Application Stores
//!
//! Process-wide state containers, constructed once by the application
//! context and shared by reference.

mod auth;
mod collection;
mod homes;
mod items;
mod modal;
mod rooms;
mod session;
mod theme;

pub use auth::{AuthFormState, AuthMode, AuthStore};
pub use collection::{CacheState, CollectionCache, PendingWrite};
pub use homes::{HomeStore, DEFAULT_HOME_NAME};
pub use items::ItemStore;
pub use modal::{ModalFlags, ModalKey, ModalStore};
pub use rooms::RoomStore;
pub use session::{SessionState, SessionStore};
pub use theme::{ResolvedTheme, ThemeMode, ThemeStore, THEME_STORAGE_KEY};
