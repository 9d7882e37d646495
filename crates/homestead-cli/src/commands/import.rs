//! Import command handler

use std::path::Path;

use anyhow::Result;

use homestead_core::{ConflictStrategy, Store};

use crate::output::{Output, OutputFormat};

/// Import a bundle file
///
/// Returns whether the import succeeded so the caller can set the exit code.
pub async fn run(
    store: &Store,
    file: &Path,
    strategy: Option<ConflictStrategy>,
    user: Option<String>,
    output: &Output,
) -> Result<bool> {
    let strategy = strategy.unwrap_or(store.config().default_strategy);
    let user_id = user.unwrap_or_else(|| store.config().user_id.clone());

    let outcome = store.import_file(file, strategy, &user_id).await?;

    match output.format {
        OutputFormat::Json => output.json(&outcome),
        _ if !outcome.success => output.failure(&outcome.message),
        OutputFormat::Quiet => println!("{}", outcome.record_count),
        OutputFormat::Human => {
            output.success(&outcome.message);
            if outcome.skipped_count > 0 {
                println!(
                    "  {} record(s) already existed and were kept (strategy: {})",
                    outcome.skipped_count, strategy
                );
            }
        }
    }

    Ok(outcome.success)
}
