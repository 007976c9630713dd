//! Collection names and the global lock order.
//!
//! ```text
//!   sites < subsites < zones < bookings < kpr_applications
//!         < installment_plans < payments < users < domains
//! ```
//!
//! The derived `Ord` IS the lock order: the guard sorts requested names
//! before acquiring, so two operations can never wait on each other.

use std::fmt;

use kavling_core::{Booking, InstallmentPlan, KprApplication, Payment, Record, Site, Subsite, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionName {
    Sites,
    Subsites,
    Zones,
    Bookings,
    KprApplications,
    InstallmentPlans,
    Payments,
    /// Loaded and validated, never written here.
    Users,
    /// Loaded and validated, never written here.
    Domains,
}

impl CollectionName {
    /// Every required collection, in lock order.
    pub const ALL: [CollectionName; 9] = [
        CollectionName::Sites,
        CollectionName::Subsites,
        CollectionName::Zones,
        CollectionName::Bookings,
        CollectionName::KprApplications,
        CollectionName::InstallmentPlans,
        CollectionName::Payments,
        CollectionName::Users,
        CollectionName::Domains,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            CollectionName::Sites => "sites.json",
            CollectionName::Subsites => "subsites.json",
            CollectionName::Zones => "zones.json",
            CollectionName::Bookings => "bookings.json",
            CollectionName::KprApplications => "kpr_applications.json",
            CollectionName::InstallmentPlans => "installment_plans.json",
            CollectionName::Payments => "payments.json",
            CollectionName::Users => "users.json",
            CollectionName::Domains => "domains.json",
        }
    }

    pub fn from_file_name(file: &str) -> Option<CollectionName> {
        CollectionName::ALL.into_iter().find(|n| n.file_name() == file)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Maps a domain record to the collection that stores it.
pub trait StoredRecord: Record {
    const COLLECTION: CollectionName;
}

macro_rules! stored_in {
    ($($ty:ty => $name:ident),* $(,)?) => {
        $(impl StoredRecord for $ty {
            const COLLECTION: CollectionName = CollectionName::$name;
        })*
    };
}

stored_in! {
    Site => Sites,
    Subsite => Subsites,
    Zone => Zones,
    Booking => Bookings,
    KprApplication => KprApplications,
    InstallmentPlan => InstallmentPlans,
    Payment => Payments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_matches_all() {
        let mut sorted = CollectionName::ALL;
        sorted.sort();
        assert_eq!(sorted, CollectionName::ALL);
        assert!(CollectionName::KprApplications < CollectionName::InstallmentPlans);
        assert!(CollectionName::InstallmentPlans < CollectionName::Payments);
    }

    #[test]
    fn test_file_names_round_trip() {
        for name in CollectionName::ALL {
            assert_eq!(CollectionName::from_file_name(name.file_name()), Some(name));
        }
        assert_eq!(CollectionName::from_file_name("tickets.json"), None);
    }
}
