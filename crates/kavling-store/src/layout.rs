//! Storage layout initialisation.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::names::CollectionName;
use crate::persist::write_collection;

/// Creates `dir` and any missing collection file as an empty collection.
/// Existing files are left alone. Returns the collections it created.
pub fn ensure_layout(dir: &Path) -> StoreResult<Vec<CollectionName>> {
    if dir.as_os_str().is_empty() {
        return Err(StoreError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    fs::create_dir_all(dir).map_err(|_| StoreError::MissingDirectory {
        path: dir.to_path_buf(),
    })?;

    let mut created = Vec::new();
    for name in CollectionName::ALL {
        if dir.join(name.file_name()).exists() {
            continue;
        }
        write_collection(dir, name, &Collection::empty())?;
        created.push(name);
    }

    if !created.is_empty() {
        info!(dir = %dir.display(), created = ?created, "Storage layout initialised");
    }
    Ok(created)
}
