//! Repository Layer
//!
//! Seams to the external collaborators (remote document store, identity
//! provider, local key/value storage, OS colour scheme) and in-process
//! implementations of each.

mod color_scheme;
mod identity;
mod local_storage;
mod memory;
mod traits;

pub use color_scheme::{ColorSchemeSource, StaticColorScheme};
pub use identity::{IdentityProvider, MemoryIdentityProvider};
pub use local_storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use memory::{MemoryDocumentStore, Operation};
pub use traits::{DocumentSnapshot, DocumentStore, Filter, Query};
