//! # Store Capabilities
//!
//! Repositories are generic over what they need from the store:
//!
//! ```text
//! ReadStore  ── storage_ready / storage_dir / snapshot / get_items
//!     ▲
//! WriteStore ── begin(names) / reload
//! ```
//!
//! Read-only handlers only require [`ReadStore`], so a handler that should
//! never write cannot reach [`WriteStore::begin`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::names::CollectionName;
use crate::store::{EntityStore, Snapshot, WriteSession};

pub trait ReadStore: Send + Sync {
    fn storage_ready(&self) -> bool;

    fn storage_dir(&self) -> &Path;

    fn snapshot(&self) -> StoreResult<Arc<Snapshot>>;

    /// Items of one collection as generic JSON.
    fn get_items(&self, name: CollectionName) -> StoreResult<BTreeMap<String, serde_json::Value>> {
        Ok(self.snapshot()?.items(name))
    }
}

pub trait WriteStore: ReadStore {
    fn begin(&self, names: &[CollectionName]) -> StoreResult<WriteSession<'_>>;

    fn reload(&self) -> StoreResult<()>;
}

impl ReadStore for EntityStore {
    fn storage_ready(&self) -> bool {
        EntityStore::storage_ready(self)
    }

    fn storage_dir(&self) -> &Path {
        EntityStore::storage_dir(self)
    }

    fn snapshot(&self) -> StoreResult<Arc<Snapshot>> {
        EntityStore::snapshot(self)
    }
}

impl WriteStore for EntityStore {
    fn begin(&self, names: &[CollectionName]) -> StoreResult<WriteSession<'_>> {
        EntityStore::begin(self, names)
    }

    fn reload(&self) -> StoreResult<()> {
        EntityStore::reload(self)
    }
}
