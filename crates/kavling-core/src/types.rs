//! # Domain Types
//!
//! Records persisted in the collection files.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   Site ──< Subsite ──< Zone ──< Booking ──< KprApplication              │
//! │                                                │                        │
//! │                                                ├── InstallmentPlan      │
//! │                                                │     └── ScheduleLine[] │
//! │                                                │                        │
//! │                                                └──< Payment (ledger)    │
//! │                                                      dp | installment   │
//! │                                                      | penalty          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record lives under a string key in its collection's `items` map.
//! The key is canonical: the store overwrites a record's `id` field with its
//! key on decode, so a record body with a stale or missing `id` still reads
//! correctly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::time::{rfc3339, rfc3339_option};
use crate::validation::ValidationResult;

// =============================================================================
// Record Trait
// =============================================================================

/// A record stored in a collection file.
pub trait Record: Serialize + DeserializeOwned {
    /// Human-readable entity name used in errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

macro_rules! impl_record {
    ($ty:ty, $entity:literal) => {
        impl Record for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

// =============================================================================
// Site Hierarchy
// =============================================================================

/// Top-level land development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Site {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// A block within a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Subsite {
    #[serde(default)]
    pub id: String,
    pub site_id: String,
    pub name: String,
}

/// A bookable plot within a subsite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Zone {
    #[serde(default)]
    pub id: String,
    pub subsite_id: String,
    pub name: String,
}

impl_record!(Site, "site");
impl_record!(Subsite, "subsite");
impl_record!(Zone, "zone");

// =============================================================================
// Booking
// =============================================================================

/// Booking lifecycle.
///
/// ```text
///   pending ──► confirmed ──► cancelled
///      │                          ▲
///      └──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parses user input; blank means "not supplied".
    pub fn parse(raw: &str) -> ValidationResult<Option<BookingStatus>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        BookingStatus::ALL
            .iter()
            .copied()
            .find(|s| s.as_str() == raw)
            .map(Some)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: "pending, confirmed, cancelled".to_string(),
            })
    }

    /// Transition table. A self-transition is always allowed.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Confirmed, Confirmed)
                | (Cancelled, Cancelled)
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    /// Cancelled bookings no longer occupy their date range.
    pub fn blocks_zone(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// A reservation of one zone over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    pub site_id: String,
    pub subsite_id: String,
    pub zone_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: String,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl_record!(Booking, "booking");

// =============================================================================
// KPR Application
// =============================================================================

/// KPR lifecycle.
///
/// ```text
///   draft ──submit──► submitted ──approve──► approved ──(all paid)──► completed
///     │                  │   │
///     │                  │   └──reject──► rejected
///     └──cancel──────────┴──cancel──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum KprStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl KprStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KprStatus::Draft => "draft",
            KprStatus::Submitted => "submitted",
            KprStatus::Approved => "approved",
            KprStatus::Rejected => "rejected",
            KprStatus::Cancelled => "cancelled",
            KprStatus::Completed => "completed",
        }
    }

    /// Notes, customer and price may only change before a decision.
    pub fn is_editable(&self) -> bool {
        matches!(self, KprStatus::Draft | KprStatus::Submitted)
    }

    /// Payments are accepted once approved, and keep being accepted after
    /// completion (penalties, late reconciliation).
    pub fn accepts_payments(&self) -> bool {
        matches!(self, KprStatus::Approved | KprStatus::Completed)
    }

    /// Whether a KPR in this status prevents a new application for the same
    /// booking. Only a cancelled application frees the booking.
    pub fn holds_booking(&self) -> bool {
        !matches!(self, KprStatus::Cancelled)
    }
}

/// Applicant details. Empty strings mean "not provided yet".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KprCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nik: String,
    #[serde(default)]
    pub address: String,
}

/// Financing figures. `dp_paid` is derived from the payment ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KprPrice {
    #[serde(default)]
    pub land_price: Money,
    #[serde(default)]
    pub dp_amount: Money,
    #[serde(default)]
    pub dp_paid: Money,
    #[serde(default)]
    pub loan_amount: Money,
    #[serde(default)]
    pub tenor_months: u32,
    /// Annual rate in percent. Informational; the flat formula ignores it.
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub admin_fee: Money,
    #[serde(default)]
    pub other_fee: Money,
    #[serde(default)]
    pub total: Money,
}

impl KprPrice {
    /// Down payment still owed.
    pub fn dp_remaining(&self) -> Money {
        self.dp_amount.remaining_after(self.dp_paid)
    }
}

/// A financing application tied to one confirmed booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KprApplication {
    #[serde(default)]
    pub id: String,
    pub booking_id: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub subsite_id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub customer: KprCustomer,
    #[serde(default)]
    pub price: KprPrice,
    pub status: KprStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "rfc3339_option", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl_record!(KprApplication, "kpr");

// =============================================================================
// Installment Plan
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScheduleStatus {
    Unpaid,
    Partial,
    Paid,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Unpaid => "unpaid",
            ScheduleStatus::Partial => "partial",
            ScheduleStatus::Paid => "paid",
        }
    }

    /// Status implied by a paid amount against the amount due.
    pub fn for_amounts(amount: Money, paid: Money) -> ScheduleStatus {
        if paid >= amount {
            ScheduleStatus::Paid
        } else if paid.is_positive() {
            ScheduleStatus::Partial
        } else {
            ScheduleStatus::Unpaid
        }
    }
}

/// One monthly installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScheduleLine {
    pub no: u32,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub paid_amount: Money,
    pub status: ScheduleStatus,
}

impl ScheduleLine {
    pub fn remaining(&self) -> Money {
        self.amount.remaining_after(self.paid_amount)
    }

    pub fn is_settled(&self) -> bool {
        self.status == ScheduleStatus::Paid || self.paid_amount >= self.amount
    }
}

/// Flat-formula repayment schedule for one approved KPR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InstallmentPlan {
    #[serde(default)]
    pub id: String,
    pub kpr_id: String,
    #[serde(default = "default_formula")]
    pub formula: String,
    pub loan_amount: Money,
    pub tenor_months: u32,
    pub monthly_amount: Money,
    pub schedule: Vec<ScheduleLine>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn default_formula() -> String {
    crate::installment::FLAT_FORMULA.to_string()
}

impl InstallmentPlan {
    pub fn line(&self, no: u32) -> Option<&ScheduleLine> {
        self.schedule.iter().find(|l| l.no == no)
    }

    pub fn line_mut(&mut self, no: u32) -> Option<&mut ScheduleLine> {
        self.schedule.iter_mut().find(|l| l.no == no)
    }

    /// True when the schedule is non-empty and every line is settled.
    pub fn all_paid(&self) -> bool {
        !self.schedule.is_empty() && self.schedule.iter().all(ScheduleLine::is_settled)
    }

    pub fn principal_paid(&self) -> Money {
        self.schedule.iter().map(|l| l.paid_amount).sum()
    }

    /// Sorts lines by number. Older files were not always written in order.
    pub fn sort_schedule(&mut self) {
        self.schedule.sort_by_key(|l| l.no);
    }
}

impl_record!(InstallmentPlan, "installment plan");

// =============================================================================
// Payment Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentType {
    Dp,
    Installment,
    Penalty,
}

/// An immutable ledger entry. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub kpr_id: String,
    #[serde(default)]
    pub booking_id: String,
    /// 0 for down payments.
    #[serde(default)]
    pub installment_no: u32,
    pub amount: Money,
    #[ts(as = "String")]
    pub paid_at: NaiveDate,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// `YYYY-MM` month key, penalty records only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl_record!(Payment, "payment");

impl Payment {
    /// Ledger order: creation time, then id.
    pub fn ledger_order(a: &Payment, b: &Payment) -> std::cmp::Ordering {
        a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_booking_status_parse() {
        assert_eq!(BookingStatus::parse("").unwrap(), None);
        assert_eq!(
            BookingStatus::parse(" confirmed ").unwrap(),
            Some(BookingStatus::Confirmed)
        );
        assert!(BookingStatus::parse("done").is_err());
    }

    #[test]
    fn test_kpr_decodes_legacy_float_amounts() {
        let raw = r#"{
            "id": "kpr_1",
            "booking_id": "bk_1",
            "site_id": "s", "subsite_id": "ss", "zone_id": "z",
            "customer": {"name": "Budi"},
            "price": {"land_price": 100000000.0, "dp_amount": 5000000, "loan_amount": 12000000.4, "tenor_months": 12},
            "status": "approved",
            "notes": "",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "approved_at": "2025-01-20T10:00:00+07:00"
        }"#;
        let kpr: KprApplication = serde_json::from_str(raw).unwrap();
        assert_eq!(kpr.price.loan_amount.rupiah(), 12_000_000);
        assert_eq!(kpr.price.dp_paid, Money::zero());
        assert_eq!(kpr.customer.nik, "");
        assert_eq!(
            kpr.approved_at.map(|t| crate::time::format_timestamp(&t)),
            Some("2025-01-20T03:00:00Z".to_string())
        );
    }

    #[test]
    fn test_payment_type_field_name() {
        let raw = r#"{"type":"dp","kpr_id":"k","amount":10,"paid_at":"2025-01-01","created_at":"2025-01-01T00:00:00Z"}"#;
        let p: Payment = serde_json::from_str(raw).unwrap();
        assert_eq!(p.kind, PaymentType::Dp);
        assert_eq!(p.installment_no, 0);

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["type"], "dp");
        assert!(back.get("bucket").is_none());
    }

    #[test]
    fn test_schedule_status_for_amounts() {
        let amt = Money::from_rupiah(100);
        assert_eq!(ScheduleStatus::for_amounts(amt, Money::zero()), ScheduleStatus::Unpaid);
        assert_eq!(ScheduleStatus::for_amounts(amt, Money::from_rupiah(1)), ScheduleStatus::Partial);
        assert_eq!(ScheduleStatus::for_amounts(amt, amt), ScheduleStatus::Paid);
    }
}
