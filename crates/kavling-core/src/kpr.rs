//! # KPR Lifecycle State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KPR Status Transitions                           │
//! │                                                                         │
//! │   action    from                 to          gate                       │
//! │   ───────   ──────────────────   ─────────   ─────────────────────────  │
//! │   submit    draft                submitted                              │
//! │   approve   submitted            approved    approval validator         │
//! │   reject    submitted            rejected                               │
//! │   cancel    draft | submitted    cancelled                              │
//! │                                                                         │
//! │   completed is derived by payment application, never requested.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition compares the stored status against the expected `from`
//! state of the latest snapshot; a mismatch is a conflict and nothing changes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Booking, BookingStatus, KprApplication, KprCustomer, KprPrice, KprStatus};
use crate::validation::{self, non_blank, required};

// =============================================================================
// Actions
// =============================================================================

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KprAction {
    Submit,
    Approve,
    Reject,
    Cancel,
}

impl KprAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            KprAction::Submit => "submit",
            KprAction::Approve => "approve",
            KprAction::Reject => "reject",
            KprAction::Cancel => "cancel",
        }
    }

    /// Allowed source states.
    pub fn from_states(&self) -> &'static [KprStatus] {
        match self {
            KprAction::Submit => &[KprStatus::Draft],
            KprAction::Approve | KprAction::Reject => &[KprStatus::Submitted],
            KprAction::Cancel => &[KprStatus::Draft, KprStatus::Submitted],
        }
    }

    pub fn target(&self) -> KprStatus {
        match self {
            KprAction::Submit => KprStatus::Submitted,
            KprAction::Approve => KprStatus::Approved,
            KprAction::Reject => KprStatus::Rejected,
            KprAction::Cancel => KprStatus::Cancelled,
        }
    }
}

/// Applies `action` to `current`, returning the next record.
///
/// Approval runs [`validate_for_approval`] and stamps `approved_at`.
pub fn transition(current: &KprApplication, action: KprAction, now: DateTime<Utc>) -> CoreResult<KprApplication> {
    let target = action.target();
    if !action.from_states().contains(&current.status) {
        return Err(CoreError::InvalidTransition {
            entity: "kpr",
            id: current.id.clone(),
            from: current.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    if action == KprAction::Approve {
        validate_for_approval(current)?;
    }

    let mut next = current.clone();
    next.status = target;
    next.updated_at = now;
    if action == KprAction::Approve {
        next.approved_at = Some(now);
    }
    Ok(next)
}

/// Approval gate: customer name, positive loan and tenor.
pub fn validate_for_approval(kpr: &KprApplication) -> CoreResult<()> {
    if kpr.customer.name.trim().is_empty() {
        return Err(ValidationError::required("customer.name").into());
    }
    if !kpr.price.loan_amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price.loan_amount".to_string(),
        }
        .into());
    }
    if kpr.price.tenor_months == 0 {
        return Err(ValidationError::MustBePositive {
            field: "price.tenor_months".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Create
// =============================================================================

/// Create body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KprCreateInput {
    #[serde(default)]
    pub booking_id: String,
    #[serde(default)]
    pub notes: String,
}

/// Builds a draft application for `booking`.
///
/// ## Rules
/// - the booking must be confirmed
/// - no other application for the booking may be live; only cancelled
///   applications free the booking
pub fn create_for_booking<'a, I>(
    booking: &Booking,
    existing: I,
    id: String,
    notes: &str,
    now: DateTime<Utc>,
) -> CoreResult<KprApplication>
where
    I: IntoIterator<Item = &'a KprApplication>,
{
    if booking.status != BookingStatus::Confirmed {
        return Err(CoreError::BookingNotConfirmed {
            booking_id: booking.id.clone(),
        });
    }
    if let Some(live) = existing
        .into_iter()
        .find(|k| k.booking_id == booking.id && k.status.holds_booking())
    {
        return Err(CoreError::KprAlreadyExists {
            booking_id: booking.id.clone(),
            kpr_id: live.id.clone(),
        });
    }

    Ok(KprApplication {
        id,
        booking_id: booking.id.clone(),
        site_id: booking.site_id.clone(),
        subsite_id: booking.subsite_id.clone(),
        zone_id: booking.zone_id.clone(),
        customer: KprCustomer::default(),
        price: KprPrice::default(),
        status: KprStatus::Draft,
        notes: notes.trim().to_string(),
        created_at: now,
        updated_at: now,
        approved_at: None,
    })
}

impl KprCreateInput {
    pub fn booking_id(&self) -> CoreResult<String> {
        Ok(required("booking_id", &self.booking_id)?)
    }
}

// =============================================================================
// Update
// =============================================================================

/// Customer fields in an update body. Blank fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KprCustomerInput {
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

/// Price block in an update body. Replaces every figure except `dp_paid`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KprPriceInput {
    #[serde(default)]
    pub land_price: Money,
    #[serde(default)]
    pub dp_amount: Money,
    #[serde(default)]
    pub loan_amount: Money,
    #[serde(default)]
    pub tenor_months: u32,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub admin_fee: Money,
    #[serde(default)]
    pub other_fee: Money,
    #[serde(default)]
    pub total: Money,
}

/// Update body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KprUpdateInput {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub customer: Option<KprCustomerInput>,
    #[serde(default)]
    pub price: Option<KprPriceInput>,
}

impl KprUpdateInput {
    /// Merges the body into `current`. Only draft and submitted
    /// applications are editable.
    pub fn apply_to(&self, current: &KprApplication, now: DateTime<Utc>) -> CoreResult<KprApplication> {
        if !current.status.is_editable() {
            return Err(CoreError::NotEditable {
                entity: "kpr",
                id: current.id.clone(),
                status: current.status.as_str().to_string(),
            });
        }

        let mut next = current.clone();
        if let Some(notes) = non_blank(Some(&self.notes)) {
            next.notes = notes;
        }

        if let Some(c) = &self.customer {
            let slots: [(&str, &mut String); 5] = [
                (c.name.as_str(), &mut next.customer.name),
                (c.phone.as_str(), &mut next.customer.phone),
                (c.email.as_str(), &mut next.customer.email),
                (c.nik.as_str(), &mut next.customer.nik),
                (c.address.as_str(), &mut next.customer.address),
            ];
            for (incoming, slot) in slots {
                if let Some(v) = non_blank(Some(incoming)) {
                    *slot = v;
                }
            }
        }

        if let Some(p) = &self.price {
            if !p.interest_rate.is_finite() || p.interest_rate < 0.0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: "price.interest_rate".to_string(),
                }
                .into());
            }
            next.price = KprPrice {
                land_price: validation::non_negative("price.land_price", p.land_price)?,
                dp_amount: validation::non_negative("price.dp_amount", p.dp_amount)?,
                dp_paid: current.price.dp_paid,
                loan_amount: validation::non_negative("price.loan_amount", p.loan_amount)?,
                tenor_months: p.tenor_months,
                interest_rate: p.interest_rate,
                admin_fee: validation::non_negative("price.admin_fee", p.admin_fee)?,
                other_fee: validation::non_negative("price.other_fee", p.other_fee)?,
                total: validation::non_negative("price.total", p.total)?,
            };
        }

        next.updated_at = now;
        Ok(next)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap()
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: "bk_1".into(),
            site_id: "s1".into(),
            subsite_id: "ss1".into(),
            zone_id: "z1".into(),
            customer_name: "Budi".into(),
            customer_phone: String::new(),
            customer_email: String::new(),
            status,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            price: Money::from_rupiah(150_000_000),
            notes: String::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    const NO_KPRS: [&'static KprApplication; 0] = [];

    fn draft() -> KprApplication {
        create_for_booking(&booking(BookingStatus::Confirmed), NO_KPRS, "kpr_1".into(), "", now()).unwrap()
    }

    fn approvable() -> KprApplication {
        let mut k = draft();
        k.customer.name = "Budi".into();
        k.price.loan_amount = Money::from_rupiah(12_000_000);
        k.price.tenor_months = 12;
        k
    }

    #[test]
    fn test_create_requires_confirmed_booking() {
        let err = create_for_booking(&booking(BookingStatus::Pending), NO_KPRS, "k".into(), "", now()).unwrap_err();
        assert_eq!(err.to_string(), "booking not confirmed");
    }

    #[test]
    fn test_create_copies_location_and_starts_draft() {
        let k = draft();
        assert_eq!(k.status, KprStatus::Draft);
        assert_eq!(k.zone_id, "z1");
        assert_eq!(k.price, KprPrice::default());
    }

    #[test]
    fn test_one_live_kpr_per_booking() {
        let first = draft();
        let err = create_for_booking(&booking(BookingStatus::Confirmed), [&first], "k2".into(), "", now())
            .unwrap_err();
        assert_eq!(err.to_string(), "kpr already exists for booking");

        let mut rejected = first.clone();
        rejected.status = KprStatus::Rejected;
        assert!(
            create_for_booking(&booking(BookingStatus::Confirmed), [&rejected], "k2".into(), "", now()).is_err()
        );

        let mut cancelled = first;
        cancelled.status = KprStatus::Cancelled;
        assert!(
            create_for_booking(&booking(BookingStatus::Confirmed), [&cancelled], "k2".into(), "", now()).is_ok()
        );
    }

    #[test]
    fn test_happy_path_transitions() {
        let k = approvable();
        let k = transition(&k, KprAction::Submit, now()).unwrap();
        assert_eq!(k.status, KprStatus::Submitted);
        let k = transition(&k, KprAction::Approve, now()).unwrap();
        assert_eq!(k.status, KprStatus::Approved);
        assert_eq!(k.approved_at, Some(now()));
    }

    #[test]
    fn test_every_disallowed_transition_is_rejected() {
        let statuses = [
            KprStatus::Draft,
            KprStatus::Submitted,
            KprStatus::Approved,
            KprStatus::Rejected,
            KprStatus::Cancelled,
            KprStatus::Completed,
        ];
        let actions = [KprAction::Submit, KprAction::Approve, KprAction::Reject, KprAction::Cancel];
        for status in statuses {
            for action in actions {
                let mut k = approvable();
                k.status = status;
                let result = transition(&k, action, now());
                if action.from_states().contains(&status) {
                    assert_eq!(result.unwrap().status, action.target());
                } else {
                    assert!(
                        matches!(result, Err(CoreError::InvalidTransition { .. })),
                        "{:?} from {:?} should be rejected",
                        action,
                        status
                    );
                }
            }
        }
    }

    #[test]
    fn test_approval_validator() {
        let mut k = draft();
        k.status = KprStatus::Submitted;
        let err = transition(&k, KprAction::Approve, now()).unwrap_err();
        assert_eq!(err.to_string(), "customer.name is required");

        k.customer.name = "Budi".into();
        let err = transition(&k, KprAction::Approve, now()).unwrap_err();
        assert_eq!(err.to_string(), "price.loan_amount must be > 0");

        k.price.loan_amount = Money::from_rupiah(1);
        let err = transition(&k, KprAction::Approve, now()).unwrap_err();
        assert_eq!(err.to_string(), "price.tenor_months must be > 0");
    }

    #[test]
    fn test_update_merges_and_keeps_dp_paid() {
        let mut k = draft();
        k.customer.phone = "0812".into();
        k.price.dp_paid = Money::from_rupiah(1_000);

        let input = KprUpdateInput {
            notes: String::new(),
            customer: Some(KprCustomerInput {
                name: " Budi ".into(),
                ..Default::default()
            }),
            price: Some(KprPriceInput {
                dp_amount: Money::from_rupiah(5_000_000),
                loan_amount: Money::from_rupiah(12_000_000),
                tenor_months: 12,
                ..Default::default()
            }),
        };
        let next = input.apply_to(&k, now()).unwrap();
        assert_eq!(next.customer.name, "Budi");
        assert_eq!(next.customer.phone, "0812");
        assert_eq!(next.price.dp_paid.rupiah(), 1_000);
        assert_eq!(next.price.tenor_months, 12);
    }

    #[test]
    fn test_update_rejected_after_decision() {
        let mut k = approvable();
        k.status = KprStatus::Approved;
        assert!(matches!(
            KprUpdateInput::default().apply_to(&k, now()),
            Err(CoreError::NotEditable { .. })
        ));
    }

    #[test]
    fn test_update_rejects_negative_amounts() {
        let k = draft();
        let input = KprUpdateInput {
            price: Some(KprPriceInput {
                dp_amount: Money::from_rupiah(-1),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(input.apply_to(&k, now()).is_err());
    }
}
