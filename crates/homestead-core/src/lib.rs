//! Homestead Core Library
//!
//! This crate provides the core functionality for Homestead, a local-first
//! record keeper for gardens, livestock, orchards, hives, chores and money.
//!
//! # Architecture
//!
//! - **SQLite**: every domain collection lives in one `records` table
//! - **Transfer engine**: exports scopes as JSON bundles or CSV and merges
//!   JSON bundles back in under a conflict strategy
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! store.put_record("animals", &Record::new("a-1").with_field("name", "Daisy")).await?;
//!
//! let artifact = store.export(Scope::Livestock, ExportFormat::Json, "local").await?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Record type and sync bookkeeping fields
//! - `scope`: Scope registry mapping scopes to collections
//! - `storage`: Storage backend trait, SQLite implementation, artifact files
//! - `transfer`: Export, import and transfer history
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod scope;
pub mod storage;
pub mod store;
pub mod transfer;

pub use config::Config;
pub use models::{Record, RecordError, SyncStatus};
pub use scope::{Scope, ScopeRegistry, UnknownScope};
pub use storage::{SqliteBackend, StorageBackend, StorageError, StorageResult};
pub use store::{StorageStats, Store};
pub use transfer::{
    ConflictStrategy, ExportArtifact, ExportFormat, ExportRecord, ImportArtifact, ImportOutcome,
    ImportRecord, TransferEngine, TransferError,
};
