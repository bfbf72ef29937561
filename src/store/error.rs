use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying engine could not be opened: the database directory or
    /// its schema manifest is missing, unreadable, or corrupt.
    #[error("storage unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// A get/put/clear failed mid-operation. The on-disk collection is left
    /// as it was: writes land in a temp file that is renamed into place.
    #[error("transaction failed on collection `{collection}`: {reason}")]
    TransactionFailed { collection: String, reason: String },
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn transaction(collection: &str, err: impl std::fmt::Display) -> Self {
        StoreError::TransactionFailed {
            collection: collection.to_string(),
            reason: err.to_string(),
        }
    }
}
