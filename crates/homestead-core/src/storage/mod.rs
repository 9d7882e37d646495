//! Storage layer
//!
//! The generic collection store consumed by the transfer engine and by every
//! domain screen, plus artifact file helpers.
//!
//! ## Architecture
//!
//! - **`StorageBackend`**: async trait, open string collection names
//! - **`SqliteBackend`**: single-table SQLite implementation
//! - **`artifact`**: atomic writes for exported files

pub mod artifact;
pub mod backend;
pub mod error;
pub mod schema;
pub mod sqlite;

pub use artifact::{atomic_write, read_artifact, write_artifact};
pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteBackend;
