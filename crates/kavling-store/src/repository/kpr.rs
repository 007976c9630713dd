//! # KPR Repository
//!
//! ```text
//! create(booking_id)          locks: bookings, kpr_applications
//!     booking must be confirmed; no live KPR may reference it
//!
//! update / submit / approve / reject / cancel
//!                             locks: kpr_applications
//!     draft ──submit──► submitted ──approve──► approved
//!       │                   │
//!       └──cancel──┬────────┴──reject──► rejected
//!                  ▼
//!              cancelled
//! ```

use chrono::Utc;
use kavling_core::kpr::{self as rules, KprAction, KprCreateInput, KprUpdateInput};
use kavling_core::views::KprView;
use kavling_core::{Booking, CoreError, KprApplication, ValidationError};
use tracing::info;

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{Bookings, KprApplications};

#[derive(Debug)]
pub struct KprRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> KprRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        KprRepository { store }
    }

    pub fn get(&self, id: &str) -> StoreResult<KprApplication> {
        self.store.snapshot()?.require::<KprApplication>(id)
    }

    /// The application for `booking_id`. A live application wins over
    /// cancelled ones; among equals the newest wins.
    pub fn get_by_booking(&self, booking_id: &str, is_admin: bool) -> StoreResult<KprView> {
        let booking_id = booking_id.trim();
        if booking_id.is_empty() {
            return Err(ValidationError::required("booking_id").into());
        }
        let kprs = self.store.snapshot()?.records::<KprApplication>();
        kprs.values()
            .filter(|k| k.booking_id == booking_id)
            .max_by(|a, b| {
                a.status
                    .holds_booking()
                    .cmp(&b.status.holds_booking())
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .map(|k| KprView::new(k, is_admin))
            .ok_or_else(|| CoreError::not_found("kpr", booking_id).into())
    }
}

impl<S: WriteStore> KprRepository<'_, S> {
    pub fn create(&self, input: &KprCreateInput) -> StoreResult<KprApplication> {
        let booking_id = input.booking_id()?;
        let now = Utc::now();
        let session = self.store.begin(&[Bookings, KprApplications])?;
        let snapshot = session.snapshot();

        let booking = snapshot.require::<Booking>(&booking_id)?;
        let id = ids::new_id(ids::KPR, now);
        let existing = snapshot.records::<KprApplication>();
        let kpr = rules::create_for_booking(&booking, existing.values(), id, &input.notes, now)?;

        let write = session.with_record(&kpr)?;
        session.commit(vec![write], now)?;
        info!(kpr_id = %kpr.id, booking_id = %kpr.booking_id, "KPR created");
        Ok(kpr)
    }

    pub fn update(&self, id: &str, input: &KprUpdateInput) -> StoreResult<KprApplication> {
        let now = Utc::now();
        let session = self.store.begin(&[KprApplications])?;
        let current = session.snapshot().require::<KprApplication>(id)?;
        let kpr = input.apply_to(&current, now)?;

        let write = session.with_record(&kpr)?;
        session.commit(vec![write], now)?;
        info!(kpr_id = %kpr.id, "KPR updated");
        Ok(kpr)
    }

    pub fn submit(&self, id: &str) -> StoreResult<KprApplication> {
        self.transition(id, KprAction::Submit)
    }

    pub fn approve(&self, id: &str) -> StoreResult<KprApplication> {
        self.transition(id, KprAction::Approve)
    }

    pub fn reject(&self, id: &str) -> StoreResult<KprApplication> {
        self.transition(id, KprAction::Reject)
    }

    pub fn cancel(&self, id: &str) -> StoreResult<KprApplication> {
        self.transition(id, KprAction::Cancel)
    }

    fn transition(&self, id: &str, action: KprAction) -> StoreResult<KprApplication> {
        let now = Utc::now();
        let session = self.store.begin(&[KprApplications])?;
        let current = session.snapshot().require::<KprApplication>(id)?;
        let kpr = rules::transition(&current, action, now)?;

        let write = session.with_record(&kpr)?;
        session.commit(vec![write], now)?;
        info!(
            kpr_id = %kpr.id,
            from = current.status.as_str(),
            to = kpr.status.as_str(),
            "KPR {}",
            action.as_str()
        );
        Ok(kpr)
    }
}
