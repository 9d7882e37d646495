//! Artifact files on disk
//!
//! Exported bundles are written with an atomic write (write to temp file,
//! sync, then rename) so a crash never leaves a half-written export behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// Write an artifact into `dir` under `filename`, returning the full path
pub fn write_artifact(dir: &Path, filename: &str, data: &[u8]) -> StorageResult<PathBuf> {
    let path = dir.join(filename);
    atomic_write(&path, data)?;
    Ok(path)
}

/// Read an artifact fully into memory
pub fn read_artifact(path: &Path) -> StorageResult<Vec<u8>> {
    fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound {
            path: path.to_path_buf(),
        },
        _ => StorageError::ReadError {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// On failure the temp file is removed.
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let result = write_synced(&temp_path, data).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        })
    });

    if result.is_err() {
        // Best effort; the original error is what gets reported
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_synced(temp_path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = File::create(temp_path)
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
