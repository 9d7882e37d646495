//! Transfer engine
//!
//! Wires the exporter, importer and history log to one storage backend and
//! exposes the public transfer API.

use std::sync::Arc;

use super::error::TransferResult;
use super::export::{ExportArtifact, Exporter};
use super::format::{ConflictStrategy, ExportFormat};
use super::history::{ExportRecord, ImportRecord, TransferHistory};
use super::import::{ImportArtifact, ImportOutcome, Importer};
use crate::scope::Scope;
use crate::storage::{StorageBackend, StorageResult};

/// Export/import entry point over a storage backend
#[derive(Clone)]
pub struct TransferEngine {
    exporter: Exporter,
    importer: Importer,
    history: TransferHistory,
}

impl TransferEngine {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let history = TransferHistory::new(backend.clone());
        Self {
            exporter: Exporter::new(backend.clone(), history.clone()),
            importer: Importer::new(backend, history.clone()),
            history,
        }
    }

    pub async fn export_data(
        &self,
        scope: Scope,
        format: ExportFormat,
        user_id: &str,
    ) -> TransferResult<ExportArtifact> {
        self.exporter.export_data(scope, format, user_id).await
    }

    pub async fn import_data(
        &self,
        artifact: &ImportArtifact,
        strategy: ConflictStrategy,
        user_id: &str,
    ) -> ImportOutcome {
        self.importer.import_data(artifact, strategy, user_id).await
    }

    pub async fn get_export_history(&self) -> StorageResult<Vec<ExportRecord>> {
        self.history.get_export_history().await
    }

    pub async fn get_import_history(&self) -> StorageResult<Vec<ImportRecord>> {
        self.history.get_import_history().await
    }

    pub fn history(&self) -> &TransferHistory {
        &self.history
    }
}
