//! JSON-file-backed collection store.
//!
//! Each collection is one JSON document mapping primary key to record, so a
//! bulk operation is a single file write. Writes go to a sibling temp file
//! renamed into place, which makes every operation atomic within its own
//! collection: all records land or none do. Nothing here spans collections.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::Keyed;

use super::StoreError;

// ============================================================================
// Collection names
// ============================================================================

pub const ITEMS: &str = "items";
pub const LOCATIONS: &str = "locations";
pub const CATEGORIES: &str = "categories";
pub const META: &str = "meta";

/// Every collection a database carries. Schema upgrades add to this list;
/// entries are never removed, because `open` never drops collections.
const COLLECTIONS: [&str; 4] = [ITEMS, LOCATIONS, CATEGORIES, META];

/// Manifest file recording the schema version and known collections.
const MANIFEST_FILE: &str = "schema.json";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    collections: Vec<String>,
}

/// Versioned local database exposing named record collections.
///
/// Cheap to clone is not a goal here; the persistence coordinator owns the
/// single handle.
#[derive(Debug)]
pub struct Database {
    dir: PathBuf,
    schema_version: u32,
}

impl Database {
    /// Open (or create) the named database under `root`.
    ///
    /// On first open, or when `schema_version` increases, any collections
    /// not yet present are created; existing ones are never dropped. Fails
    /// with [`StoreError::Unavailable`] when the directory or manifest
    /// cannot be set up.
    pub fn open(root: &Path, name: &str, schema_version: u32) -> Result<Self, StoreError> {
        let dir = root.join(name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::unavailable(&dir, e))?;

        let manifest_path = dir.join(MANIFEST_FILE);
        let mut manifest = if manifest_path.exists() {
            let contents = fs::read_to_string(&manifest_path)
                .map_err(|e| StoreError::unavailable(&manifest_path, e))?;
            serde_json::from_str::<Manifest>(&contents)
                .map_err(|e| StoreError::unavailable(&manifest_path, e))?
        } else {
            Manifest {
                version: 0,
                collections: Vec::new(),
            }
        };

        let upgrading = manifest.version < schema_version;
        let mut created = 0usize;
        for collection in COLLECTIONS {
            if !manifest.collections.iter().any(|c| c == collection) {
                let path = dir.join(format!("{collection}.json"));
                if !path.exists() {
                    write_atomic(&path, "{}")
                        .map_err(|e| StoreError::unavailable(&path, e))?;
                }
                manifest.collections.push(collection.to_string());
                created += 1;
            }
        }

        if upgrading || created > 0 {
            manifest.version = manifest.version.max(schema_version);
            let contents = serde_json::to_string_pretty(&manifest)
                .map_err(|e| StoreError::unavailable(&manifest_path, e))?;
            write_atomic(&manifest_path, &contents)
                .map_err(|e| StoreError::unavailable(&manifest_path, e))?;
            info!(
                database = name,
                version = manifest.version,
                created, "database schema initialized"
            );
        }

        Ok(Self {
            dir,
            schema_version: manifest.version.max(schema_version),
        })
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    /// Return every record of a collection. Order is unspecified; an empty
    /// or absent collection yields an empty vec.
    pub fn get_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| StoreError::transaction(collection, e))?;
        let map: BTreeMap<String, T> = serde_json::from_str(&contents)
            .map_err(|e| StoreError::transaction(collection, e))?;

        Ok(map.into_values().collect())
    }

    /// Upsert records by primary key, atomically for this one collection.
    pub fn put_all<T>(&self, collection: &str, records: &[T]) -> Result<(), StoreError>
    where
        T: Serialize + Keyed,
    {
        let path = self.collection_path(collection);
        let mut map: BTreeMap<String, serde_json::Value> = if path.exists() {
            let contents =
                fs::read_to_string(&path).map_err(|e| StoreError::transaction(collection, e))?;
            serde_json::from_str(&contents).map_err(|e| StoreError::transaction(collection, e))?
        } else {
            BTreeMap::new()
        };

        for record in records {
            let value = serde_json::to_value(record)
                .map_err(|e| StoreError::transaction(collection, e))?;
            map.insert(record.key().to_string(), value);
        }

        let contents = serde_json::to_string_pretty(&map)
            .map_err(|e| StoreError::transaction(collection, e))?;
        write_atomic(&path, &contents).map_err(|e| StoreError::transaction(collection, e))?;

        debug!(collection, records = records.len(), "put_all committed");
        Ok(())
    }

    /// Atomically remove all records of one collection. The collection
    /// itself stays present.
    pub fn clear(&self, collection: &str) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        write_atomic(&path, "{}").map_err(|e| StoreError::transaction(collection, e))?;
        debug!(collection, "collection cleared");
        Ok(())
    }
}

/// Write contents to a temp file next to `path`, then rename into place.
/// A reader never observes a partially-written document.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

// ============================================================================
// Tests
// ============================================================================
