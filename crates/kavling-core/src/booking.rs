//! # Booking & Availability Engine
//!
//! Zone reservations over inclusive calendar-date ranges.
//!
//! ## Overlap Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two ranges A, B overlap iff  A.start <= B.end  AND  A.end >= B.start   │
//! │                                                                         │
//! │  A: 10 ───────── 15                                                     │
//! │  B:          14 ───────── 20      → overlap (14, 15 shared)            │
//! │  C:                16 ─── 20      → no overlap                          │
//! │  D:    15 ─ 15                    → overlap (single shared day)         │
//! │                                                                         │
//! │  Only non-cancelled bookings in the SAME zone take part.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: callers hand in the decoded bookings of the
//! current snapshot and persist whatever comes back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::time::parse_date;
use crate::types::{Booking, BookingStatus};
use crate::validation::{self, non_blank, required};

// =============================================================================
// Input
// =============================================================================

/// Create/update body. Blank strings mean "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub subsite_id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub notes: String,
}

impl BookingInput {
    pub fn requested_id(&self) -> Option<String> {
        non_blank(Some(&self.id))
    }

    /// Builds a new booking from a create body.
    ///
    /// Does not check the zone chain or overlap; those need stored state.
    pub fn build_new(&self, id: String, now: DateTime<Utc>) -> CoreResult<Booking> {
        let site_id = self.site_id.trim();
        let subsite_id = self.subsite_id.trim();
        let zone_id = self.zone_id.trim();
        if site_id.is_empty() || subsite_id.is_empty() || zone_id.is_empty() {
            return Err(validation_required("site_id, subsite_id, zone_id"));
        }
        let customer_name = required("customer_name", &self.customer_name)?;
        let start_raw = required("start_date", &self.start_date)?;
        let end_raw = required("end_date", &self.end_date)?;
        let start_date = parse_date("start_date", &start_raw)?;
        let end_date = parse_date("end_date", &end_raw)?;
        validation::date_range(start_date, end_date)?;
        let status = BookingStatus::parse(&self.status)?.unwrap_or(BookingStatus::Pending);
        let price = validation::non_negative("price", self.price.unwrap_or_default())?;

        Ok(Booking {
            id,
            site_id: site_id.to_string(),
            subsite_id: subsite_id.to_string(),
            zone_id: zone_id.to_string(),
            customer_name,
            customer_phone: self.customer_phone.trim().to_string(),
            customer_email: self.customer_email.trim().to_string(),
            status,
            start_date,
            end_date,
            price,
            notes: self.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Merges an update body into `current`.
    ///
    /// ## Rules
    /// - cancelled bookings are frozen
    /// - blank fields keep their current value; price changes only when given
    /// - status must follow the transition table
    pub fn apply_to(&self, current: &Booking, now: DateTime<Utc>) -> CoreResult<Booking> {
        if current.status == BookingStatus::Cancelled {
            return Err(CoreError::NotEditable {
                entity: "booking",
                id: current.id.clone(),
                status: current.status.as_str().to_string(),
            });
        }

        let mut next = current.clone();
        if let Some(v) = non_blank(Some(&self.site_id)) {
            next.site_id = v;
        }
        if let Some(v) = non_blank(Some(&self.subsite_id)) {
            next.subsite_id = v;
        }
        if let Some(v) = non_blank(Some(&self.zone_id)) {
            next.zone_id = v;
        }
        if let Some(raw) = non_blank(Some(&self.start_date)) {
            next.start_date = parse_date("start_date", &raw)?;
        }
        if let Some(raw) = non_blank(Some(&self.end_date)) {
            next.end_date = parse_date("end_date", &raw)?;
        }
        validation::date_range(next.start_date, next.end_date)?;

        if let Some(status) = BookingStatus::parse(&self.status)? {
            if !current.status.can_transition_to(status) {
                return Err(CoreError::InvalidTransition {
                    entity: "booking",
                    id: current.id.clone(),
                    from: current.status.as_str().to_string(),
                    to: status.as_str().to_string(),
                });
            }
            next.status = status;
        }

        if let Some(v) = non_blank(Some(&self.customer_name)) {
            next.customer_name = v;
        }
        if let Some(v) = non_blank(Some(&self.customer_phone)) {
            next.customer_phone = v;
        }
        if let Some(v) = non_blank(Some(&self.customer_email)) {
            next.customer_email = v;
        }
        if let Some(v) = non_blank(Some(&self.notes)) {
            next.notes = v;
        }
        if let Some(price) = self.price {
            next.price = validation::non_negative("price", price)?;
        }

        next.updated_at = now;
        Ok(next)
    }
}

fn validation_required(fields: &str) -> CoreError {
    crate::error::ValidationError::Required {
        field: fields.to_string(),
    }
    .into()
}

/// Marks a booking cancelled. Returns `None` if it already is (idempotent).
pub fn cancel(current: &Booking, now: DateTime<Utc>) -> Option<Booking> {
    if current.status == BookingStatus::Cancelled {
        return None;
    }
    let mut next = current.clone();
    next.status = BookingStatus::Cancelled;
    next.updated_at = now;
    Some(next)
}

// =============================================================================
// Overlap
// =============================================================================

/// Inclusive range intersection.
#[inline]
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// First non-cancelled booking in `zone_id` whose range intersects
/// `[start, end]`, ignoring `exclude_id`.
pub fn find_overlap<'a, I>(
    bookings: I,
    zone_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<&str>,
) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().find(|b| {
        b.zone_id == zone_id
            && b.status.blocks_zone()
            && Some(b.id.as_str()) != exclude_id
            && ranges_overlap(start, end, b.start_date, b.end_date)
    })
}

/// Rejects `candidate` if it is active and collides with another booking.
pub fn ensure_no_overlap<'a, I>(bookings: I, candidate: &Booking) -> CoreResult<()>
where
    I: IntoIterator<Item = &'a Booking>,
{
    if !candidate.status.blocks_zone() {
        return Ok(());
    }
    match find_overlap(
        bookings,
        &candidate.zone_id,
        candidate.start_date,
        candidate.end_date,
        Some(&candidate.id),
    ) {
        Some(existing) => Err(CoreError::DateOverlap {
            zone_id: candidate.zone_id.clone(),
            booking_id: existing.id.clone(),
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Availability
// =============================================================================

/// A booking blocking part of a queried range.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BlockedRange {
    pub booking_id: String,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
}

/// Result of an availability query.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Availability {
    pub zone_id: String,
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub available: bool,
    pub blocked: Vec<BlockedRange>,
}

/// Validates raw availability query parameters.
pub fn parse_availability_query(zone_id: &str, from: &str, to: &str) -> CoreResult<(String, NaiveDate, NaiveDate)> {
    let zone_id = required("zone_id", zone_id)?;
    let from_raw = required("from", from)?;
    let to_raw = required("to", to)?;
    let from = parse_date("from", &from_raw)?;
    let to = parse_date("to", &to_raw)?;
    if to < from {
        return Err(crate::error::ValidationError::inconsistent("to", "must be >= from").into());
    }
    Ok((zone_id, from, to))
}

/// Lists active bookings in `zone_id` intersecting `[from, to]`, sorted by
/// start date.
pub fn availability<'a, I>(bookings: I, zone_id: &str, from: NaiveDate, to: NaiveDate) -> Availability
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut blocked: Vec<BlockedRange> = bookings
        .into_iter()
        .filter(|b| {
            b.zone_id == zone_id
                && b.status.blocks_zone()
                && ranges_overlap(from, to, b.start_date, b.end_date)
        })
        .map(|b| BlockedRange {
            booking_id: b.id.clone(),
            status: b.status,
            start_date: b.start_date,
            end_date: b.end_date,
        })
        .collect();
    blocked.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.booking_id.cmp(&b.booking_id))
    });

    Availability {
        zone_id: zone_id.to_string(),
        from,
        to,
        available: blocked.is_empty(),
        blocked,
    }
}

// =============================================================================
// Tests
// =============================================================================
