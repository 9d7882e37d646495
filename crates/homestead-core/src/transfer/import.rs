//! Importer
//!
//! Merges a bundle back into the live store under a conflict strategy.
//! The importer never returns an error: every failure becomes an
//! [`ImportOutcome`] with `success == false` and a user-facing message.
//!
//! ## Failure behaviour
//!
//! - Unsupported format or unparseable artifact: nothing is written and no
//!   history entry is recorded. The whole artifact is validated before the
//!   first write.
//! - Storage failure mid-import (a lookup or a write): the remaining records
//!   are not processed, records already written stay written (there is no
//!   rollback), and no history entry is recorded. The message names which
//!   kind of call failed.
//!
//! Nothing isolates an import from concurrent writers; two imports touching
//! the same collection interleave record by record.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::bundle::{Bundle, BUNDLE_VERSION};
use super::error::TransferError;
use super::format::{detect_format, ConflictStrategy, DetectedFormat};
use super::history::{ImportRecord, TransferHistory};
use crate::models::{now_millis, Record};
use crate::scope::ScopeRegistry;
use crate::storage::{read_artifact, StorageBackend, StorageError, StorageResult};

/// Message returned for any artifact that cannot be parsed
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse file.";

/// An uploaded file, fully read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportArtifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ImportArtifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk; the file name is kept for format detection
    pub fn from_path(path: &Path) -> StorageResult<Self> {
        let content = read_artifact(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, content })
    }
}

/// Result of an import, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    /// Records written to the store
    pub record_count: usize,
    /// Records left alone because of `skip` or a reserved collection
    pub skipped_count: usize,
}

impl ImportOutcome {
    fn completed(record_count: usize, skipped_count: usize) -> Self {
        Self {
            success: true,
            message: format!("Successfully imported {} records.", record_count),
            record_count,
            skipped_count,
        }
    }

    fn failure(message: impl Into<String>, record_count: usize, skipped_count: usize) -> Self {
        Self {
            success: false,
            message: message.into(),
            record_count,
            skipped_count,
        }
    }
}

/// Write boundary for the records of one collection
///
/// Imports open one unit per collection and commit it once every record of
/// that collection has been handled. A transactional implementation can be
/// dropped in without changing the importer.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Write one record into the unit's collection
    async fn write(&mut self, record: &Record) -> StorageResult<()>;

    /// Close the unit, returning how many records it wrote
    async fn commit(self) -> StorageResult<usize>;
}

/// Unit of work that writes every record immediately
pub struct WriteThrough<'a> {
    backend: &'a dyn StorageBackend,
    collection: &'a str,
    written: usize,
}

impl<'a> WriteThrough<'a> {
    pub fn new(backend: &'a dyn StorageBackend, collection: &'a str) -> Self {
        Self {
            backend,
            collection,
            written: 0,
        }
    }
}

#[async_trait]
impl UnitOfWork for WriteThrough<'_> {
    async fn write(&mut self, record: &Record) -> StorageResult<()> {
        self.backend.put(self.collection, record).await?;
        self.written += 1;
        Ok(())
    }

    async fn commit(self) -> StorageResult<usize> {
        Ok(self.written)
    }
}

/// Storage failure during a merge, by the kind of call that failed
#[derive(Debug)]
enum MergeFailure {
    Read(StorageError),
    Write(StorageError),
}

impl MergeFailure {
    fn operation(&self) -> &'static str {
        match self {
            MergeFailure::Read(_) => "read",
            MergeFailure::Write(_) => "write",
        }
    }

    fn error(&self) -> &StorageError {
        match self {
            MergeFailure::Read(e) | MergeFailure::Write(e) => e,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    imported: usize,
    skipped: usize,
}

/// Merges bundles into the storage backend
#[derive(Clone)]
pub struct Importer {
    backend: Arc<dyn StorageBackend>,
    history: TransferHistory,
}

impl Importer {
    pub fn new(backend: Arc<dyn StorageBackend>, history: TransferHistory) -> Self {
        Self { backend, history }
    }

    /// Import an artifact, applying `strategy` to every colliding record
    pub async fn import_data(
        &self,
        artifact: &ImportArtifact,
        strategy: ConflictStrategy,
        user_id: &str,
    ) -> ImportOutcome {
        let started_at = now_millis();

        let format = detect_format(&artifact.file_name, &artifact.content);
        if format != DetectedFormat::Json {
            let err = TransferError::UnsupportedFormat(format.label().to_string());
            warn!("Rejected import of {}: {}", artifact.file_name, err);
            return ImportOutcome::failure(err.to_string(), 0, 0);
        }

        let bundle = match Bundle::from_json(&artifact.content) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Failed to parse {}: {}", artifact.file_name, e);
                return ImportOutcome::failure(PARSE_FAILURE_MESSAGE, 0, 0);
            }
        };

        match bundle.meta() {
            Some(meta) if meta.version > BUNDLE_VERSION => warn!(
                "Bundle version {} is newer than supported version {}; importing as-is",
                meta.version, BUNDLE_VERSION
            ),
            Some(meta) => debug!(
                "Importing bundle exported by {} (scope {}) at {}",
                meta.user_id, meta.scope, meta.exported_at
            ),
            None => debug!("Importing bundle without metadata"),
        }

        let mut tally = Tally::default();
        if let Err(failure) = self.merge(bundle, strategy, &mut tally).await {
            error!(
                "Import of {} aborted after {} records: {}",
                artifact.file_name,
                tally.imported,
                failure.error()
            );
            return ImportOutcome::failure(
                format!(
                    "Import aborted after {} records: storage {} failed.",
                    tally.imported,
                    failure.operation()
                ),
                tally.imported,
                tally.skipped,
            );
        }

        let entry = ImportRecord::completed(
            user_id,
            &artifact.file_name,
            tally.imported,
            strategy,
            started_at,
            now_millis(),
        );
        if let Err(e) = self.history.append_import(&entry).await {
            error!("Failed to record import history for {}: {}", artifact.file_name, e);
            return ImportOutcome::failure(
                format!(
                    "Imported {} records but could not record the import history.",
                    tally.imported
                ),
                tally.imported,
                tally.skipped,
            );
        }

        info!(
            "Imported {} records from {} ({} skipped, strategy {})",
            tally.imported, artifact.file_name, tally.skipped, strategy
        );
        ImportOutcome::completed(tally.imported, tally.skipped)
    }

    async fn merge(
        &self,
        bundle: Bundle,
        strategy: ConflictStrategy,
        tally: &mut Tally,
    ) -> Result<(), MergeFailure> {
        for (collection, records) in bundle.into_collections() {
            if ScopeRegistry::is_reserved(&collection) {
                warn!(
                    "Ignoring {} records for reserved collection {}",
                    records.len(),
                    collection
                );
                tally.skipped += records.len();
                continue;
            }
            if !ScopeRegistry::contains(&collection) {
                warn!("Collection {} is not in any scope; importing anyway", collection);
            }

            let mut unit = WriteThrough::new(self.backend.as_ref(), &collection);
            let mut skipped = 0;
            for mut record in records {
                let existing = self
                    .backend
                    .get(&collection, record.id())
                    .await
                    .map_err(MergeFailure::Read)?;
                if existing.is_some() && !strategy.replaces_existing() {
                    skipped += 1;
                    continue;
                }

                record.stamp_pending(now_millis());
                unit.write(&record).await.map_err(MergeFailure::Write)?;
                tally.imported += 1;
            }

            let written = unit.commit().await.map_err(MergeFailure::Write)?;
            tally.skipped += skipped;
            debug!(
                "Collection {}: {} written, {} skipped",
                collection, written, skipped
            );
        }
        Ok(())
    }
}
