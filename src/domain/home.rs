//! Home Entity
//!
//! Top-level container owned by exactly one identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, NewRecord, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Home {
    pub fn new(record: NewRecord, name: String) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            name,
            created_at: record.now,
            updated_at: record.now,
        }
    }
}

/// Fields of a home the owner may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HomePatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Entity for Home {
    const COLLECTION: &'static str = "homes";
    const LABEL: &'static str = "Home";
    const ORDER: SortOrder = SortOrder::Descending;
    const PARENT_FIELD: Option<&'static str> = None;

    type Patch = HomePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn apply(&mut self, patch: &HomePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
