//! Transfer history log
//!
//! Append-only ledger of completed exports and imports, stored through the
//! regular storage backend in two reserved collections. Entries are written
//! once by the engine and never updated or deleted.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::format::{ConflictStrategy, ExportFormat};
use crate::models::{Record, SyncStatus, SYNC_STATUS_FIELD, UPDATED_AT_FIELD};
use crate::scope::{EXPORT_HISTORY_COLLECTION, IMPORT_HISTORY_COLLECTION};
use crate::storage::{StorageBackend, StorageError, StorageResult};

/// Outcome recorded on a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub user_id: String,
    pub scope: String,
    pub format: ExportFormat,
    pub record_count: usize,
    pub file_size: usize,
    pub filename: String,
    pub status: TransferStatus,
    /// Epoch milliseconds
    pub created_at: i64,
    pub completed_at: i64,
}

impl ExportRecord {
    pub(crate) fn completed(
        user_id: &str,
        scope: &str,
        format: ExportFormat,
        record_count: usize,
        file_size: usize,
        filename: &str,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            scope: scope.to_string(),
            format,
            record_count,
            file_size,
            filename: filename.to_string(),
            status: TransferStatus::Completed,
            created_at: now_ms,
            completed_at: now_ms,
        }
    }
}

/// One completed import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    /// Always `full`: imports are not scoped
    pub scope: String,
    pub record_count: usize,
    pub conflict_strategy: ConflictStrategy,
    pub status: TransferStatus,
    pub created_at: i64,
    pub completed_at: i64,
}

impl ImportRecord {
    pub(crate) fn completed(
        user_id: &str,
        file_name: &str,
        record_count: usize,
        conflict_strategy: ConflictStrategy,
        started_ms: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            scope: "full".to_string(),
            record_count,
            conflict_strategy,
            status: TransferStatus::Completed,
            created_at: started_ms,
            completed_at: now_ms,
        }
    }
}

/// Something that can live in a history collection
trait HistoryEntry: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn created_at(&self) -> i64;
}

impl HistoryEntry for ExportRecord {
    const COLLECTION: &'static str = EXPORT_HISTORY_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

impl HistoryEntry for ImportRecord {
    const COLLECTION: &'static str = IMPORT_HISTORY_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// Read/append access to the history collections
#[derive(Clone)]
pub struct TransferHistory {
    backend: Arc<dyn StorageBackend>,
}

impl TransferHistory {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub(crate) async fn append_export(&self, entry: &ExportRecord) -> StorageResult<()> {
        self.append(entry).await
    }

    pub(crate) async fn append_import(&self, entry: &ImportRecord) -> StorageResult<()> {
        self.append(entry).await
    }

    /// All exports, newest first
    pub async fn get_export_history(&self) -> StorageResult<Vec<ExportRecord>> {
        let records = self.backend.get_all(EXPORT_HISTORY_COLLECTION).await?;
        decode_sorted(records)
    }

    /// All imports, newest first
    pub async fn get_import_history(&self) -> StorageResult<Vec<ImportRecord>> {
        let records = self.backend.get_all(IMPORT_HISTORY_COLLECTION).await?;
        decode_sorted(records)
    }

    /// Exports made by one user, newest first
    pub async fn export_history_for_user(&self, user_id: &str) -> StorageResult<Vec<ExportRecord>> {
        let records = self
            .backend
            .get_all_by_index(EXPORT_HISTORY_COLLECTION, "userId", &Value::from(user_id))
            .await?;
        decode_sorted(records)
    }

    /// Imports made by one user, newest first
    pub async fn import_history_for_user(&self, user_id: &str) -> StorageResult<Vec<ImportRecord>> {
        let records = self
            .backend
            .get_all_by_index(IMPORT_HISTORY_COLLECTION, "userId", &Value::from(user_id))
            .await?;
        decode_sorted(records)
    }

    async fn append<E: HistoryEntry + Sync>(&self, entry: &E) -> StorageResult<()> {
        let mut record = Record::from_value(serde_json::to_value(entry)?).map_err(|e| {
            StorageError::CorruptRecord {
                collection: E::COLLECTION.to_string(),
                id: entry.id().to_string(),
                details: e.to_string(),
            }
        })?;
        record.set(UPDATED_AT_FIELD, entry.created_at());
        record.set(SYNC_STATUS_FIELD, SyncStatus::Pending.as_str());

        self.backend.put(E::COLLECTION, &record).await
    }
}

fn decode_sorted<E: HistoryEntry>(records: Vec<Record>) -> StorageResult<Vec<E>> {
    let mut entries = records
        .into_iter()
        .map(|record| {
            let id = record.id().to_string();
            serde_json::from_value::<E>(record.into_value()).map_err(|e| {
                StorageError::CorruptRecord {
                    collection: E::COLLECTION.to_string(),
                    id,
                    details: e.to_string(),
                }
            })
        })
        .collect::<StorageResult<Vec<E>>>()?;

    entries.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteBackend;

    fn history() -> TransferHistory {
        TransferHistory::new(Arc::new(SqliteBackend::open_in_memory().unwrap()))
    }

    fn export_at(user: &str, created_at: i64) -> ExportRecord {
        ExportRecord::completed(
            user,
            "garden",
            ExportFormat::Json,
            4,
            120,
            "homestead_garden_2024-05-01.json",
            created_at,
        )
    }

    #[tokio::test]
    async fn test_export_history_newest_first() {
        let history = history();
        history.append_export(&export_at("u-1", 100)).await.unwrap();
        history.append_export(&export_at("u-1", 300)).await.unwrap();
        history.append_export(&export_at("u-1", 200)).await.unwrap();

        let entries = history.get_export_history().await.unwrap();
        let times: Vec<i64> = entries.iter().map(|e| e.created_at).collect();
        assert_eq!(times, [300, 200, 100]);
        assert!(entries.iter().all(|e| e.status == TransferStatus::Completed));
    }

    #[tokio::test]
    async fn test_import_history_round_trips_fields() {
        let history = history();
        let entry =
            ImportRecord::completed("u-2", "backup.json", 7, ConflictStrategy::Copy, 10, 20);
        history.append_import(&entry).await.unwrap();

        let entries = history.get_import_history().await.unwrap();
        assert_eq!(entries, vec![entry]);
        assert_eq!(entries[0].scope, "full");
        assert!(history.get_export_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_entries_are_stored_as_records() {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let history = TransferHistory::new(backend.clone());
        let entry = export_at("u-1", 42);
        history.append_export(&entry).await.unwrap();

        let stored = backend
            .get(EXPORT_HISTORY_COLLECTION, &entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("recordCount"), Some(&Value::from(4)));
        assert_eq!(stored.get("status"), Some(&Value::from("completed")));
        assert_eq!(stored.updated_at(), Some(42));
        assert_eq!(stored.sync_status(), Some(SyncStatus::Pending));
    }

    #[tokio::test]
    async fn test_history_for_user() {
        let history = history();
        history.append_export(&export_at("alice", 1)).await.unwrap();
        history.append_export(&export_at("bob", 2)).await.unwrap();
        history.append_export(&export_at("alice", 3)).await.unwrap();

        let alice = history.export_history_for_user("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].created_at, 3);
        assert!(history
            .import_history_for_user("alice")
            .await
            .unwrap()
            .is_empty());
    }
}
