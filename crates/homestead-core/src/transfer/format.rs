//! Export formats, conflict strategies and import format detection

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Artifact format produced by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Every collection in the scope, plus metadata
    #[default]
    Json,
    /// First non-empty collection only, flattened to a table
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

/// Policy applied when an imported record's id already exists locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Keep the local record, ignore the incoming one
    #[default]
    Skip,
    /// Replace the local record with the incoming one
    Overwrite,
    /// Currently identical to `Overwrite`, see [`ConflictStrategy::description`]
    Copy,
}

impl ConflictStrategy {
    pub const ALL: [ConflictStrategy; 3] = [
        ConflictStrategy::Skip,
        ConflictStrategy::Overwrite,
        ConflictStrategy::Copy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::Skip => "skip",
            ConflictStrategy::Overwrite => "overwrite",
            ConflictStrategy::Copy => "copy",
        }
    }

    /// User-facing explanation of what the strategy does to colliding ids
    pub fn description(&self) -> &'static str {
        match self {
            ConflictStrategy::Skip => {
                "Keep existing records; incoming records with a known id are ignored."
            }
            ConflictStrategy::Overwrite => {
                "Replace existing records with the incoming version."
            }
            ConflictStrategy::Copy => {
                "Behaves like overwrite for records whose id already exists. Ids are not \
                 regenerated, because that would break references held by other records \
                 (sire/dam, herd, bed)."
            }
        }
    }

    /// Whether an incoming record that collides with an existing one is written
    pub fn replaces_existing(&self) -> bool {
        match self {
            ConflictStrategy::Skip => false,
            // Copy collapses into overwrite; no id regeneration
            ConflictStrategy::Overwrite | ConflictStrategy::Copy => true,
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConflictStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown conflict strategy '{}' (expected skip, overwrite or copy)",
                    s
                )
            })
    }
}

/// Format of an artifact handed to the importer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedFormat {
    Json,
    Csv,
    /// Anything else, labelled by its uppercased extension
    Other(String),
}

impl DetectedFormat {
    /// Label used in user-facing messages
    pub fn label(&self) -> &str {
        match self {
            DetectedFormat::Json => "JSON",
            DetectedFormat::Csv => "CSV",
            DetectedFormat::Other(label) => label,
        }
    }
}

/// Detect the artifact format from its file name, then its first byte
///
/// A `.json` or `.csv` extension is trusted as-is. Without one, content whose
/// first non-whitespace byte is `{` is treated as JSON.
pub fn detect_format(file_name: &str, content: &[u8]) -> DetectedFormat {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => return DetectedFormat::Json,
        Some("csv") => return DetectedFormat::Csv,
        _ => {}
    }

    let first = content.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        return DetectedFormat::Json;
    }

    match extension {
        Some(ext) if !ext.is_empty() => DetectedFormat::Other(ext.to_ascii_uppercase()),
        _ => DetectedFormat::Other("UNKNOWN".to_string()),
    }
}
