//! Export command handler

use std::path::PathBuf;

use anyhow::Result;

use homestead_core::{ExportFormat, Scope, Store};

use crate::output::{format_size, Output, OutputFormat};

/// Export a scope and write the file into `out` (or the configured exports dir)
pub async fn run(
    store: &Store,
    scope: Scope,
    format: ExportFormat,
    out: Option<PathBuf>,
    user: Option<String>,
    output: &Output,
) -> Result<()> {
    let dir = out.unwrap_or_else(|| store.config().exports_dir());
    let user_id = user.unwrap_or_else(|| store.config().user_id.clone());

    let (artifact, path) = store.export_to_dir(scope, format, &dir, &user_id).await?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "status": "success",
                    "path": path,
                    "filename": artifact.filename,
                    "scope": artifact.scope,
                    "format": artifact.format,
                    "recordCount": artifact.record_count,
                    "fileSize": artifact.file_size
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            output.success(&format!(
                "Exported {} record(s) from {} ({})",
                artifact.record_count,
                artifact.scope,
                format_size(artifact.file_size)
            ));
            println!("  {}", path.display());
            if format == ExportFormat::Csv {
                println!("  CSV holds only the first non-empty collection of the scope.");
            }
        }
    }

    Ok(())
}
