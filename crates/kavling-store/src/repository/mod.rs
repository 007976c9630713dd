//! # Repository Module
//!
//! One repository per domain area. Every write follows the same shape:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Write Path (every mutation)                          │
//! │                                                                         │
//! │  store.bookings().create(input)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. begin(LOCKS)         lock the collections involved, in order        │
//! │  2. session.snapshot()   latest state, read under the locks             │
//! │  3. kavling-core rules   validate + build the new records (pure)        │
//! │  4. commit(writes)       atomic file writes, then one snapshot merge    │
//! │  5. drop(session)        locks released                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads take the current snapshot and never lock.
//!
//! ## Available Repositories
//!
//! - [`HierarchyRepository`] - sites, subsites, zones
//! - [`BookingRepository`] - bookings and availability
//! - [`KprRepository`] - KPR applications and their lifecycle
//! - [`InstallmentRepository`] - installment plans
//! - [`PaymentRepository`] - the payments ledger
//! - [`PenaltyRepository`] - late-fee preview and charge
//! - [`ReportRepository`] - statement, zone summary, portfolio
//! - [`Reconciler`] - ledger replay over derived state

pub mod booking;
pub mod hierarchy;
pub mod installment;
pub mod kpr;
pub mod payment;
pub mod penalty;
pub mod reconcile;
pub mod report;

pub use booking::BookingRepository;
pub use hierarchy::{Deleted, HierarchyRepository};
pub use installment::InstallmentRepository;
pub use kpr::KprRepository;
pub use payment::PaymentRepository;
pub use penalty::PenaltyRepository;
pub use reconcile::Reconciler;
pub use report::ReportRepository;

use crate::capability::ReadStore;

/// `store.bookings()`-style accessors for anything that can read.
pub trait Repositories: ReadStore + Sized {
    fn hierarchy(&self) -> HierarchyRepository<'_, Self> {
        HierarchyRepository::new(self)
    }

    fn bookings(&self) -> BookingRepository<'_, Self> {
        BookingRepository::new(self)
    }

    fn kprs(&self) -> KprRepository<'_, Self> {
        KprRepository::new(self)
    }

    fn installments(&self) -> InstallmentRepository<'_, Self> {
        InstallmentRepository::new(self)
    }

    fn payments(&self) -> PaymentRepository<'_, Self> {
        PaymentRepository::new(self)
    }

    fn penalties(&self) -> PenaltyRepository<'_, Self> {
        PenaltyRepository::new(self)
    }

    fn reports(&self) -> ReportRepository<'_, Self> {
        ReportRepository::new(self)
    }

    fn reconciler(&self) -> Reconciler<'_, Self> {
        Reconciler::new(self)
    }
}

impl<S: ReadStore> Repositories for S {}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the repository tests.

    use kavling_core::booking::BookingInput;
    use kavling_core::hierarchy::{SiteInput, SubsiteInput, ZoneInput};
    use kavling_core::kpr::{KprCreateInput, KprCustomerInput, KprPriceInput, KprUpdateInput};
    use kavling_core::{Booking, KprApplication, Money};

    use super::Repositories;
    use crate::layout::ensure_layout;
    use crate::store::EntityStore;

    pub fn store() -> (tempfile::TempDir, EntityStore) {
        let dir = tempfile::tempdir().unwrap();
        ensure_layout(dir.path()).unwrap();
        let store = EntityStore::load_from(dir.path()).unwrap();
        (dir, store)
    }

    /// `site_1 → subsite_1 → zone_1`.
    pub fn hierarchy(store: &EntityStore) {
        let h = store.hierarchy();
        h.create_site(&SiteInput {
            id: "site_1".into(),
            name: "Griya Asri".into(),
        })
        .unwrap();
        h.create_subsite(&SubsiteInput {
            id: "subsite_1".into(),
            site_id: "site_1".into(),
            name: "Blok A".into(),
        })
        .unwrap();
        h.create_zone(&ZoneInput {
            id: "zone_1".into(),
            subsite_id: "subsite_1".into(),
            name: "Kavling A1".into(),
        })
        .unwrap();
    }

    pub fn booking_input(id: &str, start: &str, end: &str, status: &str) -> BookingInput {
        BookingInput {
            id: id.into(),
            site_id: "site_1".into(),
            subsite_id: "subsite_1".into(),
            zone_id: "zone_1".into(),
            customer_name: "Budi".into(),
            customer_phone: "0812".into(),
            customer_email: "budi@example.com".into(),
            status: status.into(),
            start_date: start.into(),
            end_date: end.into(),
            price: Some(Money::from_rupiah(100_000_000)),
            notes: String::new(),
        }
    }

    pub fn confirmed_booking(store: &EntityStore, id: &str) -> Booking {
        store
            .bookings()
            .create(&booking_input(id, "2025-01-10", "2025-01-15", "confirmed"))
            .unwrap()
    }

    /// An approved KPR with dp 20,000,000 and a 3,000,000 loan over 3 months.
    pub fn approved_kpr(store: &EntityStore, booking_id: &str) -> KprApplication {
        let kprs = store.kprs();
        let kpr = kprs
            .create(&KprCreateInput {
                booking_id: booking_id.into(),
                notes: String::new(),
            })
            .unwrap();
        kprs.update(
            &kpr.id,
            &KprUpdateInput {
                notes: String::new(),
                customer: Some(KprCustomerInput {
                    name: "Budi".into(),
                    phone: "0812".into(),
                    email: "budi@example.com".into(),
                    nik: "3201".into(),
                    address: "Jl. Mawar 1".into(),
                }),
                price: Some(KprPriceInput {
                    land_price: Money::from_rupiah(23_000_000),
                    dp_amount: Money::from_rupiah(20_000_000),
                    loan_amount: Money::from_rupiah(3_000_000),
                    tenor_months: 3,
                    interest_rate: 0.0,
                    admin_fee: Money::zero(),
                    other_fee: Money::zero(),
                    total: Money::from_rupiah(23_000_000),
                }),
            },
        )
        .unwrap();
        kprs.submit(&kpr.id).unwrap();
        kprs.approve(&kpr.id).unwrap()
    }
}
