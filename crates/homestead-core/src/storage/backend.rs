//! Storage backend trait
//!
//! The generic collection store every screen and the transfer engine talk to.
//! Collections are addressed by open string names so the engine stays
//! collection-agnostic.

use async_trait::async_trait;
use serde_json::Value;

use super::error::StorageResult;
use crate::models::Record;

/// Generic collection store keyed by `(collection, id)`
///
/// # Guarantees
///
/// - `put` is idempotent and replaces any record with the same id
/// - No multi-call transactions: each method is atomic on its own, nothing more
///
/// All implementations must be `Send + Sync` so a single backend can be shared
/// between the exporter, the importer and the history log.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch one record, `None` if absent
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Record>>;

    /// Fetch every record in a collection, ordered by id
    async fn get_all(&self, collection: &str) -> StorageResult<Vec<Record>>;

    /// Fetch every record whose `field` equals `value`
    async fn get_all_by_index(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>> {
        let records = self.get_all(collection).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.get(field) == Some(value))
            .collect())
    }

    /// Insert or replace a record
    async fn put(&self, collection: &str, record: &Record) -> StorageResult<()>;

    /// Remove a record; returns whether it existed
    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> StorageResult<usize> {
        Ok(self.get_all(collection).await?.len())
    }
}
