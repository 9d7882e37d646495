//! Status command handler

use anyhow::Result;

use homestead_core::Store;

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.storage_stats().await?;
    let config = store.config();

    match output.format {
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = stats
                .collections
                .iter()
                .map(|(name, count)| (name.clone(), (*count).into()))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "user_id": config.user_id,
                    "storage": {
                        "database_path": stats.database_path,
                        "database_exists": stats.database_exists,
                        "database_size": stats.database_size
                    },
                    "counts": counts,
                    "total_records": stats.total_records()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total_records());
        }
        OutputFormat::Human => {
            println!("Homestead Status");
            println!("================");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Database: {}", stats.database_size_human());
            println!("  User:     {}", config.user_id);
            println!();
            println!("Contents:");
            if stats.collections.is_empty() {
                println!("  (no records)");
            }
            for (name, count) in &stats.collections {
                println!("  {:<20} {}", name, count);
            }
            println!();
            println!("Total records: {}", stats.total_records());
        }
    }

    Ok(())
}
