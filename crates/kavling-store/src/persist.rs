//! # Atomic Persistence
//!
//! ```text
//! write_collection(dir, name, collection)
//!   │
//!   ├─ 1. target exists?  copy → <file>.bak.<YYYYMMDD_HHMMSS.micro>   BackupFailed
//!   ├─ 2. encode                                                      EncodeFailed
//!   ├─ 3. NamedTempFile in the same dir, write, sync_all              WriteFailed
//!   ├─ 4. persist (rename over target)                                RenameFailed
//!   └─ 5. fsync the directory                                         DirSyncFailed
//! ```
//!
//! A reader of the target path sees either the complete old file or the
//! complete new one. A crash before step 4 leaves an orphaned temp file
//! that the loader never looks at.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::names::CollectionName;

/// Writes `collection` to `dir/<name>` atomically. Returns the backup path
/// when a previous file existed.
pub fn write_collection(dir: &Path, name: CollectionName, collection: &Collection) -> StoreResult<Option<PathBuf>> {
    let target = dir.join(name.file_name());

    let backup = if target.exists() {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%.6f");
        let backup = dir.join(format!("{}.bak.{}", name.file_name(), stamp));
        fs::copy(&target, &backup).map_err(|source| StoreError::BackupFailed { name, source })?;
        Some(backup)
    } else {
        None
    };

    let mut bytes = serde_json::to_vec(collection).map_err(|source| StoreError::EncodeFailed { name, source })?;
    bytes.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| StoreError::WriteFailed { name, source })?;
    tmp.write_all(&bytes)
        .map_err(|source| StoreError::WriteFailed { name, source })?;
    tmp.as_file()
        .sync_all()
        .map_err(|source| StoreError::WriteFailed { name, source })?;

    tmp.persist(&target)
        .map_err(|err| StoreError::RenameFailed { name, source: err.error })?;

    sync_dir(dir).map_err(|source| StoreError::DirSyncFailed { name, source })?;

    debug!(collection = %name, bytes = bytes.len(), "Collection written");
    Ok(backup)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

// Directory handles cannot be synced on Windows; the rename is already
// durable once MoveFileEx returns.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
