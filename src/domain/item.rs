//! Item Entity
//!
//! An inventory entry inside a room, described by a title, an optional
//! free-form type and an ordered list of key/value fields. Keys are not
//! unique; order is preserved as entered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::entity::{Entity, NewRecord, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemField {
    pub key: String,
    pub value: String,
}

impl ItemField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub home_id: String,
    pub room_id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub fields: Vec<ItemField>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Attributes supplied by the user when creating an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub home_id: String,
    pub room_id: String,
    pub title: String,
    pub item_type: Option<String>,
    pub fields: Vec<ItemField>,
}

impl NewItem {
    pub fn new(home_id: impl Into<String>, room_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            home_id: home_id.into(),
            room_id: room_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(ItemField::new(key, value));
        self
    }
}

impl Item {
    pub fn new(record: NewRecord, draft: NewItem) -> Self {
        // An empty type is stored as absent
        let item_type = draft.item_type.filter(|t| !t.is_empty());
        Self {
            id: record.id,
            home_id: draft.home_id,
            room_id: draft.room_id,
            owner_id: record.owner_id,
            title: draft.title,
            item_type,
            fields: draft.fields,
            created_at: record.now,
            updated_at: record.now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `Some("")` clears the type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", serialize_with = "serialize_type_change")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ItemField>>,
}

// A cleared type is written as null
fn serialize_type_change<S: Serializer>(item_type: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match item_type.as_deref() {
        Some("") | None => serializer.serialize_none(),
        Some(t) => serializer.serialize_str(t),
    }
}

impl ItemPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl Entity for Item {
    const COLLECTION: &'static str = "items";
    const LABEL: &'static str = "Item";
    const ORDER: SortOrder = SortOrder::Descending;
    const PARENT_FIELD: Option<&'static str> = Some("roomId");

    type Patch = ItemPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn apply(&mut self, patch: &ItemPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(item_type) = &patch.item_type {
            self.item_type = Some(item_type.clone()).filter(|t| !t.is_empty());
        }
        if let Some(fields) = &patch.fields {
            self.fields = fields.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
