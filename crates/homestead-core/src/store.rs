//! Unified storage interface
//!
//! The `Store` opens the SQLite collection store described by a `Config` and
//! exposes both plain record access (what the domain screens use) and the
//! transfer engine.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;
//!
//! store.put_record("animals", &Record::new("a-1")).await?;
//!
//! let (artifact, path) = store
//!     .export_to_dir(Scope::Livestock, ExportFormat::Json, &dir, "local")
//!     .await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::Record;
use crate::scope::Scope;
use crate::storage::{write_artifact, SqliteBackend, StorageBackend};
use crate::transfer::{
    ConflictStrategy, ExportArtifact, ExportFormat, ExportRecord, ImportArtifact, ImportOutcome,
    ImportRecord, TransferEngine,
};

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub database_path: PathBuf,
    pub database_exists: bool,
    pub database_size: u64,
    /// Record count per collection, history collections included
    pub collections: Vec<(String, usize)>,
}

impl StorageStats {
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|(_, count)| count).sum()
    }

    /// Database size in human-readable form
    pub fn database_size_human(&self) -> String {
        format_bytes(self.database_size)
    }
}

/// Unified storage interface for Homestead
pub struct Store {
    backend: Arc<SqliteBackend>,
    engine: TransferEngine,
    config: Config,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        let backend = Arc::new(
            SqliteBackend::open(&config.sqlite_path()).with_context(|| {
                format!("Failed to open database at {:?}", config.sqlite_path())
            })?,
        );
        let engine = TransferEngine::new(backend.clone());

        Ok(Self {
            backend,
            engine,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Record Operations ====================

    /// Insert or replace a record
    pub async fn put_record(&self, collection: &str, record: &Record) -> Result<()> {
        self.backend
            .put(collection, record)
            .await
            .with_context(|| format!("Failed to save record {} in {}", record.id(), collection))
    }

    /// Get a record by id
    pub async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        self.backend
            .get(collection, id)
            .await
            .with_context(|| format!("Failed to get record {} from {}", id, collection))
    }

    /// All records in a collection
    pub async fn list_records(&self, collection: &str) -> Result<Vec<Record>> {
        self.backend
            .get_all(collection)
            .await
            .with_context(|| format!("Failed to list {}", collection))
    }

    /// Records whose `field` equals `value`
    pub async fn list_records_where(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>> {
        self.backend
            .get_all_by_index(collection, field, value)
            .await
            .with_context(|| format!("Failed to query {} by {}", collection, field))
    }

    /// Delete a record; returns whether it existed
    pub async fn delete_record(&self, collection: &str, id: &str) -> Result<bool> {
        self.backend
            .delete(collection, id)
            .await
            .with_context(|| format!("Failed to delete record {} from {}", id, collection))
    }

    // ==================== Transfer Operations ====================

    /// Export a scope without writing it anywhere
    pub async fn export(
        &self,
        scope: Scope,
        format: ExportFormat,
        user_id: &str,
    ) -> Result<ExportArtifact> {
        self.engine
            .export_data(scope, format, user_id)
            .await
            .with_context(|| format!("Failed to export scope {}", scope))
    }

    /// Export a scope and write the artifact into `dir`
    pub async fn export_to_dir(
        &self,
        scope: Scope,
        format: ExportFormat,
        dir: &Path,
        user_id: &str,
    ) -> Result<(ExportArtifact, PathBuf)> {
        let artifact = self.export(scope, format, user_id).await?;
        let path = write_artifact(dir, &artifact.filename, &artifact.content)
            .with_context(|| format!("Failed to write {} to {:?}", artifact.filename, dir))?;
        Ok((artifact, path))
    }

    /// Import an in-memory artifact
    pub async fn import(
        &self,
        artifact: &ImportArtifact,
        strategy: ConflictStrategy,
        user_id: &str,
    ) -> ImportOutcome {
        self.engine.import_data(artifact, strategy, user_id).await
    }

    /// Read a file from disk and import it
    ///
    /// Only reading the file can fail; import problems are in the outcome.
    pub async fn import_file(
        &self,
        path: &Path,
        strategy: ConflictStrategy,
        user_id: &str,
    ) -> Result<ImportOutcome> {
        let artifact = ImportArtifact::from_path(path)
            .with_context(|| format!("Failed to read import file {:?}", path))?;
        Ok(self.import(&artifact, strategy, user_id).await)
    }

    /// Export history, newest first, optionally for one user
    pub async fn export_history(&self, user_id: Option<&str>) -> Result<Vec<ExportRecord>> {
        let history = match user_id {
            Some(user_id) => self.engine.history().export_history_for_user(user_id).await,
            None => self.engine.get_export_history().await,
        };
        history.context("Failed to read export history")
    }

    /// Import history, newest first, optionally for one user
    pub async fn import_history(&self, user_id: Option<&str>) -> Result<Vec<ImportRecord>> {
        let history = match user_id {
            Some(user_id) => self.engine.history().import_history_for_user(user_id).await,
            None => self.engine.get_import_history().await,
        };
        history.context("Failed to read import history")
    }

    // ==================== Stats ====================

    /// Database size and per-collection record counts
    pub async fn storage_stats(&self) -> Result<StorageStats> {
        let database_path = self.config.sqlite_path();
        let database_size = std::fs::metadata(&database_path)
            .map(|m| m.len())
            .unwrap_or(0);
        let collections = self
            .backend
            .collection_counts()
            .await
            .context("Failed to count records")?;

        Ok(StorageStats {
            database_exists: database_path.exists(),
            database_path,
            database_size,
            collections,
        })
    }
}

/// Format bytes in human-readable form
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
