//! # Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / serde_json::Error                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← which file, which step                     │
//! │       │            ▲                                                    │
//! │       │            └── CoreError passes through unchanged              │
//! │       ▼                                                                 │
//! │  ApiError (in kavling-api) ← status code + envelope                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::PathBuf;

use kavling_core::{CoreError, ErrorKind};
use thiserror::Error;

use crate::names::CollectionName;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Load
    // -------------------------------------------------------------------------
    /// STORAGE_DIR is unset, missing, or not a directory.
    #[error("storage directory not accessible: {path}")]
    MissingDirectory { path: PathBuf },

    /// A required collection file could not be read.
    #[error("load {name} failed: {source}")]
    UnreadableFile {
        name: CollectionName,
        #[source]
        source: io::Error,
    },

    /// A collection file is not valid JSON.
    #[error("load {name} failed: invalid json: {source}")]
    MalformedJson {
        name: CollectionName,
        #[source]
        source: serde_json::Error,
    },

    /// A collection file parsed but lacks the `{meta, items}` shape.
    #[error("load {name} failed: missing {missing} object")]
    MissingMetaOrItems {
        name: CollectionName,
        missing: &'static str,
    },

    // -------------------------------------------------------------------------
    // Write
    // -------------------------------------------------------------------------
    /// Copying the previous file to its backup path failed.
    #[error("backup of {name} failed: {source}")]
    BackupFailed {
        name: CollectionName,
        #[source]
        source: io::Error,
    },

    /// A record or collection could not be encoded.
    #[error("encode {name} failed: {source}")]
    EncodeFailed {
        name: CollectionName,
        #[source]
        source: serde_json::Error,
    },

    /// Creating, writing or syncing the temporary file failed.
    #[error("write {name} failed: {source}")]
    WriteFailed {
        name: CollectionName,
        #[source]
        source: io::Error,
    },

    /// Renaming the temporary file over the target failed.
    #[error("rename {name} failed: {source}")]
    RenameFailed {
        name: CollectionName,
        #[source]
        source: io::Error,
    },

    /// Syncing the directory after the rename failed.
    #[error("fsync dir for {name} failed: {source}")]
    DirSyncFailed {
        name: CollectionName,
        #[source]
        source: io::Error,
    },

    /// Some collections of a multi-file operation were written, then one
    /// failed. Ledger reconciliation repairs the gap on the next pass.
    #[error("partial commit: wrote {written:?}, then {source}")]
    PartialCommit {
        written: Vec<CollectionName>,
        #[source]
        source: Box<StoreError>,
    },

    // -------------------------------------------------------------------------
    // Runtime
    // -------------------------------------------------------------------------
    /// No snapshot has been loaded yet.
    #[error("storage not ready")]
    NotReady,

    /// A write was attempted on a collection the session did not lock.
    #[error("collection {0} is not locked by this session")]
    NotLocked(CollectionName),

    /// Domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Classifies the error. Domain errors keep their own kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Core(e) => e.kind(),
            StoreError::NotReady => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        }
    }
}

impl From<kavling_core::ValidationError> for StoreError {
    fn from(err: kavling_core::ValidationError) -> Self {
        StoreError::Core(err.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
