//! HomeBones Client
//!
//! Layered architecture:
//! - domain: Entities persisted remotely and the contracts they satisfy
//! - repository: Seams to the identity provider, document store, local
//!   storage and OS colour scheme
//! - store: Session, auth form, optimistic collection caches, theme and
//!   modal state
//! - router: Route table and navigation guard
//! - context: Startup wiring

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod context;
pub mod domain;
pub mod repository;
pub mod router;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use context::{AppContext, Backends};
pub use domain::{DomainError, DomainResult};
pub use router::{Navigation, Route, RouteGuard};

/// Lock a std mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
