//! Exporter
//!
//! Reads every collection of a scope, builds a bundle and records a history
//! entry. Collections are visited in registry order; empty ones are omitted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::bundle::{Bundle, BundleMeta, BUNDLE_VERSION};
use super::error::TransferResult;
use super::format::ExportFormat;
use super::history::{ExportRecord, TransferHistory};
use super::projection::project_first_collection;
use crate::scope::Scope;
use crate::storage::StorageBackend;

/// A produced export, ready to be saved or offered for download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// `homestead_<scope>_<YYYY-MM-DD>.<ext>`
    pub filename: String,
    pub format: ExportFormat,
    pub scope: Scope,
    pub content: Vec<u8>,
    /// Records read across every collection of the scope
    pub record_count: usize,
    /// Size of `content` in bytes
    pub file_size: usize,
    pub exported_at: DateTime<Utc>,
}

impl ExportArtifact {
    /// The artifact as text; both formats are UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Build the export filename for a scope, format and timestamp
pub fn export_filename(scope: Scope, format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "homestead_{}_{}.{}",
        scope,
        at.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Produces bundles from the storage backend
#[derive(Clone)]
pub struct Exporter {
    backend: Arc<dyn StorageBackend>,
    history: TransferHistory,
}

impl Exporter {
    pub fn new(backend: Arc<dyn StorageBackend>, history: TransferHistory) -> Self {
        Self { backend, history }
    }

    /// Export a scope in the given format and record it in the history log
    ///
    /// CSV output carries only the first non-empty collection of the scope;
    /// `record_count` still covers every collection that was read.
    pub async fn export_data(
        &self,
        scope: Scope,
        format: ExportFormat,
        user_id: &str,
    ) -> TransferResult<ExportArtifact> {
        let exported_at = Utc::now();
        debug!("Exporting scope {} as {}", scope, format);

        let mut bundle = Bundle::new();
        let mut record_count = 0;
        for collection in scope.collections() {
            let records = self.backend.get_all(collection).await?;
            if records.is_empty() {
                continue;
            }
            record_count += records.len();
            bundle.push_collection(*collection, records);
        }

        let content = match format {
            ExportFormat::Json => {
                bundle.set_meta(BundleMeta {
                    version: BUNDLE_VERSION,
                    exported_at: exported_at.timestamp_millis(),
                    scope: scope.to_string(),
                    user_id: user_id.to_string(),
                });
                bundle.to_json()?
            }
            ExportFormat::Csv => match project_first_collection(bundle.collections())? {
                Some((collection, bytes)) => {
                    debug!("CSV export carries collection {}", collection);
                    bytes
                }
                None => Vec::new(),
            },
        };

        let filename = export_filename(scope, format, exported_at);
        let file_size = content.len();

        let entry = ExportRecord::completed(
            user_id,
            scope.as_str(),
            format,
            record_count,
            file_size,
            &filename,
            exported_at.timestamp_millis(),
        );
        self.history.append_export(&entry).await?;

        info!(
            "Exported {} records from scope {} to {} ({} bytes)",
            record_count, scope, filename, file_size
        );

        Ok(ExportArtifact {
            filename,
            format,
            scope,
            content,
            record_count,
            file_size,
            exported_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::storage::SqliteBackend;
    use chrono::TimeZone;
    use serde_json::Value;

    fn setup() -> (Arc<SqliteBackend>, Exporter, TransferHistory) {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let history = TransferHistory::new(backend.clone());
        let exporter = Exporter::new(backend.clone(), history.clone());
        (backend, exporter, history)
    }

    #[test]
    fn test_export_filename() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(
            export_filename(Scope::Garden, ExportFormat::Csv, at),
            "homestead_garden_2024-03-09.csv"
        );
    }

    #[tokio::test]
    async fn test_json_export_omits_empty_collections() {
        let (backend, exporter, _) = setup();
        backend.put("plantings", &Record::new("p-1")).await.unwrap();
        backend.put("seeds", &Record::new("s-1")).await.unwrap();
        backend.put("seeds", &Record::new("s-2")).await.unwrap();
        // Outside the garden scope
        backend.put("hives", &Record::new("h-1")).await.unwrap();

        let artifact = exporter
            .export_data(Scope::Garden, ExportFormat::Json, "u-1")
            .await
            .unwrap();

        let value: Value = serde_json::from_slice(&artifact.content).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["plantings", "seeds", "meta"]);
        assert_eq!(artifact.record_count, 3);
        assert_eq!(artifact.file_size, artifact.content.len());
        assert_eq!(value["meta"]["scope"], "garden");
        assert_eq!(value["meta"]["userId"], "u-1");
        assert_eq!(value["meta"]["version"], 1);
    }

    #[tokio::test]
    async fn test_export_records_history_entry() {
        let (backend, exporter, history) = setup();
        backend.put("budgets", &Record::new("b-1")).await.unwrap();

        let artifact = exporter
            .export_data(Scope::Finances, ExportFormat::Json, "u-9")
            .await
            .unwrap();

        let entries = history.get_export_history().await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.filename, artifact.filename);
        assert_eq!(entry.scope, "finances");
        assert_eq!(entry.format, ExportFormat::Json);
        assert_eq!(entry.record_count, 1);
        assert_eq!(entry.file_size, artifact.file_size);
        assert_eq!(entry.user_id, "u-9");
    }

    #[tokio::test]
    async fn test_csv_export_uses_first_non_empty_collection_only() {
        let (backend, exporter, _) = setup();
        backend
            .put("animals", &Record::new("a-1").with_field("name", "Daisy"))
            .await
            .unwrap();
        backend
            .put("health_records", &Record::new("hr-1"))
            .await
            .unwrap();

        let artifact = exporter
            .export_data(Scope::Livestock, ExportFormat::Csv, "u-1")
            .await
            .unwrap();

        let csv = artifact.as_str().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,"));
        assert!(lines[0].contains("name"));
        assert!(lines[1].starts_with("\"a-1\""));
        assert!(!csv.contains("hr-1"));
        assert!(artifact.filename.ends_with(".csv"));
        assert_eq!(artifact.record_count, 2);
    }

    #[tokio::test]
    async fn test_empty_csv_export_is_still_recorded() {
        let (_, exporter, history) = setup();

        let artifact = exporter
            .export_data(Scope::Apiary, ExportFormat::Csv, "u-1")
            .await
            .unwrap();

        assert!(artifact.content.is_empty());
        assert_eq!(artifact.record_count, 0);
        assert_eq!(history.get_export_history().await.unwrap().len(), 1);
    }
}
