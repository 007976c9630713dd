//! # kavling-store: Collection Store for Kavling
//!
//! Every entity lives in one JSON file per collection under `STORAGE_DIR`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        kavling-store                                    │
//! │                                                                         │
//! │  repository/*        store.bookings().create(..)                        │
//! │       │              snapshot → validate (kavling-core) → write → merge │
//! │       ▼                                                                 │
//! │  capability          ReadStore / WriteStore                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store               EntityStore: Arc<Snapshot> + WriteSession          │
//! │       │                                                                 │
//! │       ├── guard      one mutex per collection, global lock order        │
//! │       ├── loader     strict load of all nine files                      │
//! │       └── persist    backup → temp file → fsync → rename → dir fsync    │
//! │                                                                         │
//! │  collection          {meta, items} codec with raw JSON items            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Files
//! ```text
//! STORAGE_DIR/
//! ├── sites.json              ├── installment_plans.json
//! ├── subsites.json           ├── payments.json
//! ├── zones.json              ├── users.json
//! ├── bookings.json           └── domains.json
//! └── kpr_applications.json
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use kavling_store::{EntityStore, Repositories};
//!
//! let store = EntityStore::load_from("./data")?;
//! store.reconciler().run()?;
//!
//! let views = store.bookings().list("zone_1", false)?;
//! let plan = store.installments().generate("kpr_1")?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capability;
pub mod collection;
pub mod error;
pub mod guard;
pub mod ids;
pub mod layout;
pub mod loader;
pub mod names;
pub mod persist;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use capability::{ReadStore, WriteStore};
pub use collection::{Collection, Meta};
pub use error::{StoreError, StoreResult};
pub use names::{CollectionName, StoredRecord};
pub use store::{EntityStore, Snapshot, WriteSession};

// Repository re-exports for convenience
pub use repository::{
    BookingRepository, Deleted, HierarchyRepository, InstallmentRepository, KprRepository, PaymentRepository,
    PenaltyRepository, Reconciler, ReportRepository, Repositories,
};
