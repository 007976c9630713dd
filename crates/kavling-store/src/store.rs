//! # Entity Store
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           EntityStore                                   │
//! │                                                                         │
//! │   readers ──► snapshot() ──► Arc<Snapshot> (immutable, shared)          │
//! │                                   ▲                                     │
//! │                                   │ swapped on reload                   │
//! │                                   │                                     │
//! │   writers ──► begin(names) ──► WriteSession                             │
//! │                 │   locks in global order                               │
//! │                 │   snapshot taken AFTER the locks                      │
//! │                 ▼                                                       │
//! │              validate against session.snapshot()                        │
//! │                 ▼                                                       │
//! │              commit(writes)  → write files in order → merge → unlock    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never take a collection lock. A reader holding an older
//! `Arc<Snapshot>` keeps a consistent view; it just won't see writes that
//! completed after it read.
//!
//! A commit swaps in a snapshot where only the collections it wrote are
//! replaced, under the snapshot write lock. Writers on disjoint collections
//! can finish in any order without putting back each other's old state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use kavling_core::Records;
use tracing::{debug, error, info};

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::guard::{Held, MutationGuard};
use crate::loader::load_all;
use crate::names::{CollectionName, StoredRecord};
use crate::persist::write_collection;

// =============================================================================
// Snapshot
// =============================================================================

/// Every collection as of one load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    collections: BTreeMap<CollectionName, Collection>,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(collections: BTreeMap<CollectionName, Collection>) -> Self {
        Snapshot {
            collections,
            loaded_at: Utc::now(),
        }
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// File names of every loaded collection, in lock order.
    pub fn loaded_files(&self) -> Vec<&'static str> {
        self.collections.keys().map(CollectionName::file_name).collect()
    }

    /// Raw collection. Loaded snapshots always contain every name.
    pub fn collection(&self, name: CollectionName) -> Option<&Collection> {
        self.collections.get(&name)
    }

    /// Decoded records of `T`'s collection.
    pub fn records<T: StoredRecord>(&self) -> Records<T> {
        self.collection(T::COLLECTION)
            .map(Collection::decode::<T>)
            .unwrap_or_default()
    }

    pub fn get<T: StoredRecord>(&self, id: &str) -> StoreResult<Option<T>> {
        match self.collection(T::COLLECTION) {
            Some(c) => c.get(id),
            None => Ok(None),
        }
    }

    pub fn require<T: StoredRecord>(&self, id: &str) -> StoreResult<T> {
        self.get(id)?
            .ok_or_else(|| kavling_core::CoreError::not_found(T::ENTITY, id).into())
    }

    pub fn contains(&self, name: CollectionName, id: &str) -> bool {
        self.collection(name).is_some_and(|c| c.contains(id))
    }

    /// Items of `name` as generic JSON values.
    pub fn items(&self, name: CollectionName) -> BTreeMap<String, serde_json::Value> {
        self.collection(name)
            .map(|c| c.values(name))
            .unwrap_or_default()
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug)]
pub struct EntityStore {
    dir: PathBuf,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    guard: MutationGuard,
}

impl EntityStore {
    /// Creates a store for `dir`. Nothing is read until [`EntityStore::load`].
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        EntityStore {
            dir: dir.into(),
            snapshot: RwLock::new(None),
            guard: MutationGuard::new(),
        }
    }

    /// Opens and loads in one step.
    pub fn load_from(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::open(dir);
        store.load()?;
        Ok(store)
    }

    /// Strict load; on success the store becomes ready.
    ///
    /// The snapshot write lock is held across the file reads, so a commit
    /// cannot merge between the read and the swap.
    pub fn load(&self) -> StoreResult<()> {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let collections = load_all(&self.dir)?;
        *slot = Some(Arc::new(Snapshot::new(collections)));
        Ok(())
    }

    /// Re-reads every file and swaps the snapshot. On failure the previous
    /// snapshot stays in place.
    pub fn reload(&self) -> StoreResult<()> {
        debug!(dir = %self.dir.display(), "Reloading storage");
        self.load()
    }

    pub fn snapshot(&self) -> StoreResult<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::NotReady)
    }

    pub fn storage_ready(&self) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn storage_dir(&self) -> &Path {
        &self.dir
    }

    /// Replaces `written` in the current snapshot, leaving every other
    /// collection as it is now.
    fn merge(&self, written: Vec<(CollectionName, Collection)>) {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let mut collections = slot
            .as_ref()
            .map(|s| s.collections.clone())
            .unwrap_or_default();
        collections.extend(written);
        *slot = Some(Arc::new(Snapshot::new(collections)));
    }

    /// Locks `names` and opens a write session over the latest snapshot.
    pub fn begin(&self, names: &[CollectionName]) -> StoreResult<WriteSession<'_>> {
        if !self.storage_ready() {
            return Err(StoreError::NotReady);
        }
        let held = self.guard.acquire(names);
        let snapshot = self.snapshot()?;
        Ok(WriteSession {
            store: self,
            held,
            snapshot,
        })
    }
}

// =============================================================================
// Write Session
// =============================================================================

/// An operation's locks plus the snapshot it validates against.
#[derive(Debug)]
pub struct WriteSession<'a> {
    store: &'a EntityStore,
    held: Held<'a>,
    snapshot: Arc<Snapshot>,
}

impl WriteSession<'_> {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Working copy of a locked collection.
    pub fn working_copy(&self, name: CollectionName) -> StoreResult<Collection> {
        if !self.held.holds(name) {
            return Err(StoreError::NotLocked(name));
        }
        Ok(self
            .snapshot
            .collection(name)
            .cloned()
            .unwrap_or_else(Collection::empty))
    }

    /// Working copy of `T`'s collection with `record` stored in it.
    pub fn with_record<T: StoredRecord>(&self, record: &T) -> StoreResult<(CollectionName, Collection)> {
        let mut c = self.working_copy(T::COLLECTION)?;
        c.put(record)?;
        Ok((T::COLLECTION, c))
    }

    /// Writes `writes` in the given order, then merges them into the
    /// snapshot in one swap.
    ///
    /// If a write fails after earlier ones succeeded, the collections that
    /// did land are still merged, so the snapshot matches what is on disk,
    /// and the error is [`StoreError::PartialCommit`].
    pub fn commit(self, writes: Vec<(CollectionName, Collection)>, now: DateTime<Utc>) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        for (name, _) in &writes {
            if !self.held.holds(*name) {
                return Err(StoreError::NotLocked(*name));
            }
        }

        let mut landed = Vec::with_capacity(writes.len());
        for (name, mut collection) in writes {
            collection.touch(now);
            if let Err(err) = write_collection(&self.store.dir, name, &collection) {
                if landed.is_empty() {
                    return Err(err);
                }
                let written: Vec<CollectionName> = landed.iter().map(|(n, _)| *n).collect();
                error!(
                    written = ?written,
                    failed = %name,
                    error = %err,
                    "Multi-collection write interrupted"
                );
                self.store.merge(landed);
                return Err(StoreError::PartialCommit {
                    written,
                    source: Box::new(err),
                });
            }
            landed.push((name, collection));
        }

        let written: Vec<CollectionName> = landed.iter().map(|(n, _)| *n).collect();
        self.store.merge(landed);
        info!(collections = ?written, "Commit complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ensure_layout;
    use kavling_core::Site;
    use std::thread;

    fn ready_store() -> (tempfile::TempDir, EntityStore) {
        let dir = tempfile::tempdir().unwrap();
        ensure_layout(dir.path()).unwrap();
        let store = EntityStore::load_from(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_not_ready_until_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::open(dir.path());
        assert!(!store.storage_ready());
        assert!(matches!(store.snapshot(), Err(StoreError::NotReady)));
        assert!(matches!(store.begin(&[CollectionName::Sites]), Err(StoreError::NotReady)));

        // A failed load leaves it not ready.
        assert!(store.load().is_err());
        assert!(!store.storage_ready());
    }

    #[test]
    fn test_commit_swaps_snapshot_and_old_snapshot_is_unchanged() {
        let (_dir, store) = ready_store();
        let before = store.snapshot().unwrap();

        let session = store.begin(&[CollectionName::Sites]).unwrap();
        let site = Site {
            id: "site_1".into(),
            name: "Griya".into(),
        };
        let write = session.with_record(&site).unwrap();
        session.commit(vec![write], Utc::now()).unwrap();

        let after = store.snapshot().unwrap();
        assert_eq!(after.require::<Site>("site_1").unwrap(), site);
        assert!(after.collection(CollectionName::Sites).unwrap().meta.updated_at.is_some());
        assert!(before.records::<Site>().is_empty());
    }

    #[test]
    fn test_write_outside_held_set_is_rejected() {
        let (_dir, store) = ready_store();
        let session = store.begin(&[CollectionName::Sites]).unwrap();
        assert!(matches!(
            session.working_copy(CollectionName::Zones),
            Err(StoreError::NotLocked(CollectionName::Zones))
        ));
        let zones = Collection::empty();
        assert!(matches!(
            session.commit(vec![(CollectionName::Zones, zones)], Utc::now()),
            Err(StoreError::NotLocked(CollectionName::Zones))
        ));
    }

    /// Concurrent read-modify-write sessions on one collection never lose
    /// an update.
    #[test]
    fn test_concurrent_sessions_serialize() {
        let (_dir, store) = ready_store();
        thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..10 {
                        let session = store.begin(&[CollectionName::Sites]).unwrap();
                        let site = Site {
                            id: format!("site_{t}_{i}"),
                            name: "x".into(),
                        };
                        let write = session.with_record(&site).unwrap();
                        session.commit(vec![write], Utc::now()).unwrap();
                    }
                });
            }
            for _ in 0..20 {
                let snap = store.snapshot().unwrap();
                let n = snap.records::<Site>().len();
                assert!(n <= 40);
            }
        });
        assert_eq!(store.snapshot().unwrap().records::<Site>().len(), 40);
    }

    /// Writers on disjoint collections finish in any order; none of them
    /// swaps back another's committed records.
    #[test]
    fn test_disjoint_writers_keep_each_others_commits() {
        use kavling_core::{Subsite, Zone};

        let (_dir, store) = ready_store();
        let rounds = 200;
        thread::scope(|s| {
            let store = &store;
            s.spawn(move || {
                for i in 0..rounds {
                    let session = store.begin(&[CollectionName::Sites]).unwrap();
                    let site = Site {
                        id: format!("site_{i}"),
                        name: "s".into(),
                    };
                    let write = session.with_record(&site).unwrap();
                    session.commit(vec![write], Utc::now()).unwrap();
                }
            });
            s.spawn(move || {
                for i in 0..rounds {
                    let session = store.begin(&[CollectionName::Subsites]).unwrap();
                    let subsite = Subsite {
                        id: format!("sub_{i}"),
                        site_id: "site_0".into(),
                        name: "b".into(),
                    };
                    let write = session.with_record(&subsite).unwrap();
                    session.commit(vec![write], Utc::now()).unwrap();
                }
            });
            s.spawn(move || {
                for i in 0..rounds {
                    let session = store.begin(&[CollectionName::Zones]).unwrap();
                    let zone = Zone {
                        id: format!("zone_{i}"),
                        subsite_id: "sub_0".into(),
                        name: "z".into(),
                    };
                    let write = session.with_record(&zone).unwrap();
                    session.commit(vec![write], Utc::now()).unwrap();
                }
            });
        });

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.records::<Site>().len(), rounds);
        assert_eq!(snap.records::<Subsite>().len(), rounds);
        assert_eq!(snap.records::<Zone>().len(), rounds);

        // Disk agrees with memory.
        store.reload().unwrap();
        let reloaded = store.snapshot().unwrap();
        assert_eq!(reloaded.records::<Site>().len(), rounds);
        assert_eq!(reloaded.records::<Subsite>().len(), rounds);
        assert_eq!(reloaded.records::<Zone>().len(), rounds);
    }

    #[test]
    fn test_partial_commit_reports_written_collections() {
        let (dir, store) = ready_store();
        let session = store
            .begin(&[CollectionName::Sites, CollectionName::Subsites])
            .unwrap();
        let sites = session
            .with_record(&Site {
                id: "site_1".into(),
                name: "A".into(),
            })
            .unwrap();
        let subsites = session.working_copy(CollectionName::Subsites).unwrap();

        // Block the second write by replacing its target with a directory.
        let target = dir.path().join("subsites.json");
        std::fs::remove_file(&target).unwrap();
        std::fs::create_dir(&target).unwrap();

        let err = session
            .commit(vec![sites, (CollectionName::Subsites, subsites)], Utc::now())
            .unwrap_err();
        match err {
            StoreError::PartialCommit { written, .. } => {
                assert_eq!(written, vec![CollectionName::Sites]);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The first file did land.
        assert!(std::fs::read_to_string(dir.path().join("sites.json")).unwrap().contains("site_1"));
        // And the snapshot shows it.
        assert!(store.snapshot().unwrap().contains(CollectionName::Sites, "site_1"));
    }
}
