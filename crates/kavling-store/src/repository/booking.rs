//! # Booking Repository
//!
//! ```text
//! create / update / cancel
//!     │  locks: sites, subsites, zones, bookings
//!     ▼
//! check_zone_chain(site → subsite → zone)
//!     ▼
//! ensure_no_overlap(zone bookings, candidate)     pending/confirmed only
//!     ▼
//! commit(bookings)
//! ```
//!
//! The overlap check and the write happen under the same bookings lock, so
//! two concurrent creates for one zone can never both pass the check.

use chrono::Utc;
use kavling_core::booking::{self as rules, Availability, BookingInput};
use kavling_core::hierarchy::check_zone_chain;
use kavling_core::views::BookingView;
use kavling_core::{Booking, Site, Subsite, ValidationError, Zone};
use tracing::{debug, info};

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{self, Bookings, Sites, Subsites, Zones};
use crate::store::{Snapshot, WriteSession};

const LOCKS: [CollectionName; 4] = [Sites, Subsites, Zones, Bookings];

#[derive(Debug)]
pub struct BookingRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> BookingRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        BookingRepository { store }
    }

    /// Bookings in `zone_id`, sorted by start date then id. Guests get the
    /// redacted view.
    pub fn list(&self, zone_id: &str, is_admin: bool) -> StoreResult<Vec<BookingView>> {
        let zone_id = zone_id.trim();
        if zone_id.is_empty() {
            return Err(ValidationError::required("zone_id").into());
        }
        let mut bookings: Vec<Booking> = self
            .store
            .snapshot()?
            .records::<Booking>()
            .into_values()
            .filter(|b| b.zone_id == zone_id)
            .collect();
        bookings.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

        debug!(zone_id = %zone_id, count = bookings.len(), "Listed bookings");
        Ok(bookings.iter().map(|b| BookingView::new(b, is_admin)).collect())
    }

    pub fn get(&self, id: &str) -> StoreResult<Booking> {
        self.store.snapshot()?.require::<Booking>(id)
    }

    pub fn availability(&self, zone_id: &str, from: &str, to: &str) -> StoreResult<Availability> {
        let (zone_id, from, to) = rules::parse_availability_query(zone_id, from, to)?;
        let bookings = self.store.snapshot()?.records::<Booking>();
        Ok(rules::availability(bookings.values(), &zone_id, from, to))
    }
}

impl<S: WriteStore> BookingRepository<'_, S> {
    pub fn create(&self, input: &BookingInput) -> StoreResult<Booking> {
        let now = Utc::now();
        let session = self.store.begin(&LOCKS)?;
        let bookings = session.working_copy(Bookings)?;
        let id = ids::resolve_id(input.requested_id(), ids::BOOKING, &bookings, "booking", now)?;

        let booking = input.build_new(id, now)?;
        check_placement(session.snapshot(), &booking)?;

        commit_booking(session, &booking)?;
        info!(
            booking_id = %booking.id,
            zone_id = %booking.zone_id,
            status = booking.status.as_str(),
            "Booking created"
        );
        Ok(booking)
    }

    pub fn update(&self, id: &str, input: &BookingInput) -> StoreResult<Booking> {
        let now = Utc::now();
        let session = self.store.begin(&LOCKS)?;
        let current = session.snapshot().require::<Booking>(id)?;

        let booking = input.apply_to(&current, now)?;
        check_placement(session.snapshot(), &booking)?;

        commit_booking(session, &booking)?;
        info!(booking_id = %booking.id, status = booking.status.as_str(), "Booking updated");
        Ok(booking)
    }

    /// Cancels `id`. Cancelling an already cancelled booking returns it
    /// unchanged without writing.
    pub fn cancel(&self, id: &str) -> StoreResult<Booking> {
        let session = self.store.begin(&LOCKS)?;
        let current = session.snapshot().require::<Booking>(id)?;

        let Some(booking) = rules::cancel(&current, Utc::now()) else {
            debug!(booking_id = %id, "Booking already cancelled");
            return Ok(current);
        };
        commit_booking(session, &booking)?;
        info!(booking_id = %booking.id, "Booking cancelled");
        Ok(booking)
    }
}

fn check_placement(snapshot: &Snapshot, booking: &Booking) -> StoreResult<()> {
    check_zone_chain(
        &snapshot.records::<Site>(),
        &snapshot.records::<Subsite>(),
        &snapshot.records::<Zone>(),
        &booking.site_id,
        &booking.subsite_id,
        &booking.zone_id,
    )?;
    let bookings = snapshot.records::<Booking>();
    rules::ensure_no_overlap(bookings.values(), booking)?;
    Ok(())
}

fn commit_booking(session: WriteSession<'_>, booking: &Booking) -> StoreResult<()> {
    let write = session.with_record(booking)?;
    session.commit(vec![write], booking.updated_at)
}
