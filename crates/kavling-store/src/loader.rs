//! Strict loader.
//!
//! Every collection in [`CollectionName::ALL`] must exist and parse into the
//! `{meta, items}` shape. One bad file fails the whole load: the store never
//! becomes partially ready.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, info};

use crate::collection::{Collection, Meta};
use crate::error::{StoreError, StoreResult};
use crate::names::CollectionName;

/// Shape check happens after parsing so a missing or null `meta`/`items`
/// gets its own error instead of a generic serde message.
#[derive(Deserialize)]
struct LooseCollection {
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    items: Option<BTreeMap<String, Box<RawValue>>>,
}

/// Loads every required collection from `dir`.
pub fn load_all(dir: &Path) -> StoreResult<BTreeMap<CollectionName, Collection>> {
    if dir.as_os_str().is_empty() || !dir.is_dir() {
        return Err(StoreError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut out = BTreeMap::new();
    for name in CollectionName::ALL {
        let collection = load_one(dir, name)?;
        debug!(collection = %name, items = collection.len(), "Loaded collection");
        out.insert(name, collection);
    }

    info!(dir = %dir.display(), collections = out.len(), "Storage loaded");
    Ok(out)
}

/// Loads and shape-checks one collection file.
pub fn load_one(dir: &Path, name: CollectionName) -> StoreResult<Collection> {
    let bytes = fs::read(dir.join(name.file_name())).map_err(|source| StoreError::UnreadableFile { name, source })?;
    parse(name, &bytes)
}

pub fn parse(name: CollectionName, bytes: &[u8]) -> StoreResult<Collection> {
    let loose: LooseCollection =
        serde_json::from_slice(bytes).map_err(|source| StoreError::MalformedJson { name, source })?;

    let meta = loose
        .meta
        .ok_or(StoreError::MissingMetaOrItems { name, missing: "meta" })?;
    let items = loose
        .items
        .ok_or(StoreError::MissingMetaOrItems { name, missing: "items" })?;

    Ok(Collection { meta, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ensure_layout;

    #[test]
    fn test_shape_errors() {
        let name = CollectionName::Sites;
        assert!(matches!(
            parse(name, br#"{"items":{}}"#),
            Err(StoreError::MissingMetaOrItems { missing: "meta", .. })
        ));
        assert!(matches!(
            parse(name, br#"{"meta":{},"items":null}"#),
            Err(StoreError::MissingMetaOrItems { missing: "items", .. })
        ));
        assert!(matches!(
            parse(name, b"{\"meta\":{},\"items\":{"),
            Err(StoreError::MalformedJson { .. })
        ));
        let ok = parse(name, br#"{"meta":{},"items":{}}"#).unwrap();
        assert_eq!(ok.meta.version, 1);
    }

    #[test]
    fn test_load_all_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_all(&dir.path().join("missing")),
            Err(StoreError::MissingDirectory { .. })
        ));

        ensure_layout(dir.path()).unwrap();
        assert_eq!(load_all(dir.path()).unwrap().len(), CollectionName::ALL.len());

        fs::remove_file(dir.path().join("domains.json")).unwrap();
        assert!(matches!(
            load_all(dir.path()),
            Err(StoreError::UnreadableFile {
                name: CollectionName::Domains,
                ..
            })
        ));
    }
}
