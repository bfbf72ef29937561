//! Application configuration management.
//!
//! This module holds the deployment constants (database name, schema
//! version, build version tag) and resolves the per-user data and cache
//! directories the durable store and resource cache live under.
//!
//! Configuration is stored at `~/.config/craftcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data/cache directory paths
pub const APP_NAME: &str = "craftcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable store database name, carried over from the original deployment
/// so existing data keeps hydrating.
pub const DB_NAME: &str = "craft-storage-tracker";

/// Durable store schema version. Bumping it makes `Database::open` create
/// any newly added collections; existing ones are never dropped.
pub const SCHEMA_VERSION: u32 = 1;

/// Version tag bound to the current build. Bump on every release; the
/// resource cache derives its generation identifier from it.
pub const BUILD_VERSION: &str = "v4";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
    /// Origin the application is served from, for same-origin checks.
    pub app_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root the durable store database lives under.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Root the resource cache generations live under.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// The configured application origin, parsed. Same-origin checks in the
    /// resource cache are meaningless without one, so unset is an error.
    pub fn app_origin(&self) -> Result<reqwest::Url> {
        let origin = self
            .app_origin
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("app_origin is not configured"))?;
        Ok(reqwest::Url::parse(origin)?)
    }
}
