//! Data transfer engine
//!
//! Bundles collections into portable snapshots and merges snapshots back into
//! the live store.
//!
//! ## Flow
//!
//! 1. `Exporter` reads a scope's collections and produces JSON or CSV
//! 2. `Importer` validates a JSON bundle and merges it record by record
//! 3. Both append an entry to the `TransferHistory` on completion
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TransferEngine::new(backend);
//! let artifact = engine.export_data(Scope::Garden, ExportFormat::Json, "local").await?;
//!
//! let upload = ImportArtifact::new(artifact.filename.clone(), artifact.content.clone());
//! let outcome = engine.import_data(&upload, ConflictStrategy::Skip, "local").await;
//! ```

mod bundle;
mod engine;
mod error;
mod export;
mod format;
mod history;
mod import;
mod projection;

pub use bundle::{Bundle, BundleMeta, BUNDLE_VERSION, META_KEY};
pub use engine::TransferEngine;
pub use error::{TransferError, TransferResult};
pub use export::{export_filename, ExportArtifact, Exporter};
pub use format::{detect_format, ConflictStrategy, DetectedFormat, ExportFormat};
pub use history::{ExportRecord, ImportRecord, TransferHistory, TransferStatus};
pub use import::{
    ImportArtifact, ImportOutcome, Importer, UnitOfWork, WriteThrough, PARSE_FAILURE_MESSAGE,
};
pub use projection::{project_first_collection, records_to_csv};
