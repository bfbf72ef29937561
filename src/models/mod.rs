//! Data models for the craft inventory.
//!
//! This module contains the record types persisted by the durable store
//! and exchanged with the backup serializer:
//!
//! - `Item`: an inventoried object, keyed by its unique name
//! - `LocationRecord`, `CategoryRecord`: store rows for plain string ids
//! - `MetaRecord`: schema-version bookkeeping
//!
//! The built-in first-run seed dataset lives in [`seed`].

pub mod seed;

use serde::{Deserialize, Serialize};

/// A record with a primary key, as the durable store upserts them.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// An inventoried item. The name is the primary key; renaming an item is a
/// delete-under-old-key plus insert-under-new-key at the storage layer.
///
/// `photo_src` is an opaque reference (URL or embedded byte-encoded image);
/// the core never decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub location: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "photoSrc", default, skip_serializing_if = "Option::is_none")]
    pub photo_src: Option<String>,
}

impl Keyed for Item {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Store row for a location id. In memory locations are plain strings; the
/// store keeps them as `{ "id": ... }` rows keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
}

impl Keyed for LocationRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Store row for a category id, same shape as [`LocationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
}

impl Keyed for CategoryRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Key/value row reserved for schema-version bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub key: String,
    pub value: String,
}

impl Keyed for MetaRecord {
    fn key(&self) -> &str {
        &self.key
    }
}
