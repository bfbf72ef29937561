//! On-disk cache generations.
//!
//! A generation is one JSON file in the cache root, named by the
//! application namespace prefix plus the version tag it was built for, and
//! holding a map of request key to cached resource. Lookups, inserts and
//! generation deletes are point operations on a single generation; nothing
//! here spans generations, so individual atomicity (temp file + rename for
//! writes) is all that is needed under concurrent requests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CacheError;

/// One cached response body with its content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResource {
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Directory of generation files.
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: PathBuf) -> Result<Self, CacheError> {
        fs::create_dir_all(&root)
            .map_err(|e| CacheError::Unavailable(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    fn generation_path(&self, generation: &str) -> PathBuf {
        self.root.join(format!("{generation}.json"))
    }

    fn read_generation(
        &self,
        generation: &str,
    ) -> Result<BTreeMap<String, CachedResource>, CacheError> {
        let path = self.generation_path(generation);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| CacheError::Unavailable(format!("{generation}: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| CacheError::Unavailable(format!("{generation}: {e}")))
    }

    /// Look up a cached entry in one generation.
    pub fn lookup(
        &self,
        generation: &str,
        key: &str,
    ) -> Result<Option<CachedResource>, CacheError> {
        Ok(self.read_generation(generation)?.remove(key))
    }

    /// Store an entry under `key`, creating the generation if needed.
    pub fn insert(
        &self,
        generation: &str,
        key: &str,
        resource: CachedResource,
    ) -> Result<(), CacheError> {
        let mut entries = self.read_generation(generation)?;
        entries.insert(key.to_string(), resource);

        let path = self.generation_path(generation);
        let contents = serde_json::to_string(&entries)
            .map_err(|e| CacheError::Unavailable(format!("{generation}: {e}")))?;
        write_atomic(&path, &contents)
            .map_err(|e| CacheError::Unavailable(format!("{generation}: {e}")))?;

        debug!(generation, key, "cache entry stored");
        Ok(())
    }

    /// Names of every generation currently on disk.
    pub fn list_generations(&self) -> Result<Vec<String>, CacheError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| CacheError::Unavailable(format!("{}: {e}", self.root.display())))?;

        let mut generations = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| CacheError::Unavailable(format!("{}: {e}", self.root.display())))?;
            let name = entry.file_name();
            if let Some(name) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                generations.push(name.to_string());
            }
        }
        Ok(generations)
    }

    /// Delete an entire generation. Deleting one that does not exist is not
    /// an error.
    pub fn remove_generation(&self, generation: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.generation_path(generation)) {
            Ok(()) => {
                debug!(generation, "cache generation evicted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Unavailable(format!("{generation}: {e}"))),
        }
    }
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

// ============================================================================
// Tests
// ============================================================================
