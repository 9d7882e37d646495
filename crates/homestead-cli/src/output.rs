//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use homestead_core::models::millis_to_datetime;
use homestead_core::{ExportRecord, ImportRecord, Record};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: could not serialize output: {}", e),
        }
    }

    /// Print a single record
    pub fn print_record(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                for (key, value) in record.fields() {
                    println!("{:<16} {}", format!("{}:", key), render_value(value));
                }
            }
            OutputFormat::Json => self.json(record),
            OutputFormat::Quiet => println!("{}", record.id()),
        }
    }

    /// Print a list of records from one collection
    pub fn print_records(&self, collection: &str, records: &[Record]) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No records in {}.", collection);
                    return;
                }
                for record in records {
                    let summary: Vec<String> = record
                        .fields()
                        .iter()
                        .filter(|(key, _)| key.as_str() != "id")
                        .take(3)
                        .map(|(key, value)| format!("{}={}", key, render_value(value)))
                        .collect();
                    println!("{} | {}", record.id(), truncate(&summary.join(", "), 70));
                }
                println!("\n{} record(s)", records.len());
            }
            OutputFormat::Json => self.json(records),
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", record.id());
                }
            }
        }
    }

    /// Print export history entries
    pub fn print_export_history(&self, entries: &[ExportRecord]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No exports yet.");
                    return;
                }
                for entry in entries {
                    println!(
                        "{} | {:<10} | {:<4} | {:>6} records | {:>10} | {}",
                        format_millis(entry.created_at),
                        entry.scope,
                        entry.format.as_str(),
                        entry.record_count,
                        format_size(entry.file_size),
                        entry.filename
                    );
                }
                println!("\n{} export(s)", entries.len());
            }
            OutputFormat::Json => self.json(entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print import history entries
    pub fn print_import_history(&self, entries: &[ImportRecord]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No imports yet.");
                    return;
                }
                for entry in entries {
                    println!(
                        "{} | {:<9} | {:>6} records | {} | {}",
                        format_millis(entry.created_at),
                        entry.conflict_strategy.as_str(),
                        entry.record_count,
                        entry.status,
                        entry.file_name
                    );
                }
                println!("\n{} import(s)", entries.len());
            }
            OutputFormat::Json => self.json(entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a failure message; shown even in quiet mode
    pub fn failure(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => eprintln!("✗ {}", message),
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Strings print bare, everything else as compact JSON
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Epoch milliseconds as a UTC timestamp
pub fn format_millis(ms: i64) -> String {
    millis_to_datetime(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
