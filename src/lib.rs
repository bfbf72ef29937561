//! craftcache - offline-first persistence and resource-cache core for a
//! personal craft inventory.
//!
//! The crate keeps a small dataset (items, locations, categories) durable
//! across restarts without any server, and keeps the application shell
//! usable without network connectivity:
//!
//! - [`store`]: versioned durable store with atomic per-collection ops
//! - [`persist`]: in-memory state, hydration/seeding, debounced commits
//! - [`cache`]: versioned resource cache with install/activation and
//!   network-first/cache-first fetch strategies
//! - [`backup`]: portable full-state snapshots
//!
//! Rendering, form editing and application-shell composition are external
//! collaborators and live elsewhere.

pub mod backup;
pub mod cache;
pub mod config;
pub mod logging;
pub mod models;
pub mod persist;
pub mod store;

pub use backup::{BackupFile, FormatError, Snapshot};
pub use cache::{CacheError, HttpFetcher, ResourceCacheManager};
pub use config::Config;
pub use models::Item;
pub use persist::{Coordinator, Inventory};
pub use store::{Database, StoreError};
