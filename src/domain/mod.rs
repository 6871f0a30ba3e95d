//! Domain Layer
//!
//! Entities persisted in the remote document store and the contracts
//! the collection caches rely on.

mod entity;
mod home;
mod identity;
mod item;
mod room;

pub use entity::{
    from_document, patch_document, to_document, Document, DomainError, DomainResult, Entity, NewRecord,
    SortOrder,
};
pub use home::{Home, HomePatch};
pub use identity::Identity;
pub use item::{Item, ItemField, ItemPatch, NewItem};
pub use room::{Room, RoomPatch};
