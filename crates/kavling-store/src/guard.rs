//! # Mutation Guard
//!
//! One mutex per collection, created once when the store is opened.
//!
//! ```text
//! acquire([Payments, KprApplications, InstallmentPlans])
//!     │
//!     ▼  sort + dedup by CollectionName's Ord
//! lock(KprApplications) → lock(InstallmentPlans) → lock(Payments)
//!     │
//!     ▼
//! Held { ... }   ← dropped at the end of the operation, after reload
//! ```
//!
//! Because every caller locks in the same total order, no two operations can
//! each hold a lock the other is waiting for.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::names::CollectionName;

#[derive(Debug)]
pub struct MutationGuard {
    locks: BTreeMap<CollectionName, Mutex<()>>,
}

impl Default for MutationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationGuard {
    pub fn new() -> Self {
        MutationGuard {
            locks: CollectionName::ALL.into_iter().map(|n| (n, Mutex::new(()))).collect(),
        }
    }

    /// Locks `names` in global order and returns once all are held.
    ///
    /// A poisoned lock is taken over; the state it guards lives on disk.
    pub fn acquire(&self, names: &[CollectionName]) -> Held<'_> {
        let mut ordered = names.to_vec();
        ordered.sort();
        ordered.dedup();

        let guards = ordered
            .iter()
            .filter_map(|name| self.locks.get(name))
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        trace!(collections = ?ordered, "Locks acquired");
        Held {
            names: ordered,
            _guards: guards,
        }
    }
}

/// Locks held by one operation. Released on drop.
#[derive(Debug)]
pub struct Held<'a> {
    names: Vec<CollectionName>,
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl Held<'_> {
    pub fn holds(&self, name: CollectionName) -> bool {
        self.names.binary_search(&name).is_ok()
    }

    pub fn names(&self) -> &[CollectionName] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_acquire_sorts_and_dedups() {
        let guard = MutationGuard::new();
        let held = guard.acquire(&[
            CollectionName::Payments,
            CollectionName::KprApplications,
            CollectionName::Payments,
        ]);
        assert_eq!(
            held.names(),
            &[CollectionName::KprApplications, CollectionName::Payments]
        );
        assert!(held.holds(CollectionName::Payments));
        assert!(!held.holds(CollectionName::Bookings));
    }

    /// Opposite caller orders over overlapping sets: finishes (no deadlock)
    /// and never lets two holders of the same collection overlap.
    #[test]
    fn test_overlapping_sets_serialize_without_deadlock() {
        let guard = MutationGuard::new();
        let inside = AtomicUsize::new(0);
        let entered = AtomicUsize::new(0);

        thread::scope(|s| {
            for t in 0..8 {
                let guard = &guard;
                let inside = &inside;
                let entered = &entered;
                s.spawn(move || {
                    let set: &[CollectionName] = if t % 2 == 0 {
                        &[CollectionName::Payments, CollectionName::KprApplications]
                    } else {
                        &[CollectionName::KprApplications, CollectionName::InstallmentPlans, CollectionName::Payments]
                    };
                    for _ in 0..200 {
                        let _held = guard.acquire(set);
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        entered.fetch_add(1, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(entered.load(Ordering::SeqCst), 8 * 200);
    }
}
