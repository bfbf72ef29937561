//! Versioned resource cache for offline operation.
//!
//! This module keeps previously fetched shell resources servable without
//! network connectivity:
//!
//! - [`CacheStore`]: on-disk generation files, one per deployed version tag
//! - [`ResourceCacheManager`]: generation install/activation and the
//!   per-request fetch strategies (network-first documents, cache-first
//!   assets, cross-origin passthrough)
//! - [`Fetch`] / [`HttpFetcher`]: the network seam
//!
//! Cache failures degrade to uncached network passthrough; they never halt
//! the caller.

pub mod error;
pub mod fetch;
pub mod manager;
pub mod store;

pub use error::CacheError;
pub use fetch::{Fetch, FetchError, FetchedResource, HttpFetcher, RequestMode, ResourceRequest};
pub use manager::{GenerationState, ResourceCacheManager};
pub use store::{CacheStore, CachedResource};
