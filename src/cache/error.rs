use thiserror::Error;

use super::fetch::FetchError;

#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache store directory or a generation file is inaccessible.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The network fetch failed and no cached fallback existed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
