//! Portable backup snapshots.
//!
//! A snapshot is a self-describing UTF-8 JSON document carrying the schema
//! version, the three full collections, and an export timestamp. It is
//! independent of the durable store: the file-export collaborator receives
//! the bytes, and restore hands a parsed snapshot back to the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SCHEMA_VERSION;
use crate::models::Item;
use crate::persist::Inventory;

/// Backup file name prefix; the suffix is the export time in unix millis.
const BACKUP_FILE_PREFIX: &str = "craft-storage-backup";

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("backup payload is not valid JSON: {0}")]
    Json(String),

    /// The payload lacks one of the required collections, or carries it as
    /// something other than a sequence.
    #[error("backup payload missing collection `{0}` (must be a sequence)")]
    MissingCollection(&'static str),
}

/// A serialized snapshot plus the suggested download name, as handed to the
/// file-export collaborator.
#[derive(Debug, Clone)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

/// Full-state snapshot of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub items: Vec<Item>,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    #[serde(rename = "exportedAt", default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl Snapshot {
    /// Capture the current in-memory state, stamped with the export time.
    pub fn capture(inventory: &Inventory) -> Self {
        Self {
            version: SCHEMA_VERSION,
            items: inventory.items.clone(),
            locations: inventory.locations.clone(),
            categories: inventory.categories.clone(),
            exported_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn export(&self) -> Result<BackupFile, serde_json::Error> {
        Ok(BackupFile {
            file_name: format!(
                "{BACKUP_FILE_PREFIX}-{}.json",
                self.exported_at.timestamp_millis()
            ),
            contents: self.to_json()?,
        })
    }

    /// Parse a backup payload. This is a shape check, not per-record
    /// validation: the payload must be JSON and carry `items`, `locations`
    /// and `categories` as sequences (possibly empty).
    pub fn from_slice(payload: &[u8]) -> Result<Self, FormatError> {
        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(|e| FormatError::Json(e.to_string()))?;

        for collection in ["items", "locations", "categories"] {
            let is_sequence = value
                .get(collection)
                .map(serde_json::Value::is_array)
                .unwrap_or(false);
            if !is_sequence {
                return Err(FormatError::MissingCollection(collection));
            }
        }

        serde_json::from_value(value).map_err(|e| FormatError::Json(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
