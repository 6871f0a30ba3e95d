//! Room Entity
//!
//! Belongs to exactly one home.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, NewRecord, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub home_id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(record: NewRecord, home_id: String, name: String) -> Self {
        Self {
            id: record.id,
            home_id,
            owner_id: record.owner_id,
            name,
            created_at: record.now,
            updated_at: record.now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RoomPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Entity for Room {
    const COLLECTION: &'static str = "rooms";
    const LABEL: &'static str = "Room";
    const ORDER: SortOrder = SortOrder::Ascending;
    const PARENT_FIELD: Option<&'static str> = Some("homeId");

    type Patch = RoomPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn apply(&mut self, patch: &RoomPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
