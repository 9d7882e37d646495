//! Transfer errors
//!
//! Only the exporter surfaces these to callers. The importer folds every
//! failure into an [`ImportOutcome`](super::ImportOutcome).

use thiserror::Error;

use crate::models::RecordError;
use crate::storage::StorageError;

/// Errors raised while producing or consuming a bundle
#[derive(Error, Debug)]
pub enum TransferError {
    /// The artifact format cannot be imported
    #[error("{0} import not supported for full restore yet.")]
    UnsupportedFormat(String),

    /// The artifact is not valid JSON
    #[error("Malformed bundle: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact is JSON but does not have the bundle shape
    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    /// A record inside the bundle is unusable
    #[error("Invalid record in collection '{collection}': {source}")]
    InvalidRecord {
        collection: String,
        #[source]
        source: RecordError,
    },

    /// Building the CSV projection failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;
