//! # Payment Application
//!
//! Applies one down-payment or installment payment to a KPR and its plan.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PaymentInput ──validate──► ValidPayment                                │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │  apply(kpr, plan) ─────────────────────────────────────────────┐        │
//! │    installment_no == 0 ─► DP:   remaining = dp_amount - dp_paid │        │
//! │    installment_no >= 1 ─► line: remaining = amount - paid       │        │
//! │                                                                 │        │
//! │    remaining == 0       → AlreadyPaid                           │        │
//! │    amount > remaining   → Overpayment                           │        │
//! │    otherwise            → paid += amount, line → partial|paid   │        │
//! │                           all lines paid → KPR completed        │        │
//! │                                                                 ▼        │
//! │  PaymentOutcome { ledger record, changed kpr?, changed plan? }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The inputs are never mutated: a rejected payment leaves the caller's
//! records untouched, and the outcome says exactly which records changed so
//! only those collections are written.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::time::parse_date_or;
use crate::types::{InstallmentPlan, KprApplication, KprStatus, Payment, PaymentType, ScheduleStatus};
use crate::validation::{non_blank, positive, required};

/// Payment body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub kpr_id: String,
    /// Optional; when given it must match the KPR's booking.
    #[serde(default)]
    pub booking_id: String,
    /// 0 for the down payment, 1..=tenor for an installment.
    #[serde(default)]
    pub installment_no: i64,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub notes: String,
    /// `YYYY-MM-DD`, defaults to today.
    #[serde(default)]
    pub paid_at: String,
}

/// A payment body that passed input validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayment {
    pub kpr_id: String,
    pub booking_id: Option<String>,
    pub installment_no: u32,
    pub amount: Money,
    pub method: String,
    pub reference: String,
    pub notes: String,
    pub paid_at: NaiveDate,
}

impl PaymentInput {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<ValidPayment> {
        let kpr_id = required("kpr_id", &self.kpr_id)?;
        let installment_no = u32::try_from(self.installment_no).map_err(|_| ValidationError::MustBeNonNegative {
            field: "installment_no".to_string(),
        })?;
        let amount = positive("amount", self.amount)?;
        let method = required("method", &self.method)?;
        let paid_at = parse_date_or("paid_at", Some(&self.paid_at), today)?;

        Ok(ValidPayment {
            kpr_id,
            booking_id: non_blank(Some(&self.booking_id)),
            installment_no,
            amount,
            method,
            reference: self.reference.trim().to_string(),
            notes: self.notes.trim().to_string(),
            paid_at,
        })
    }
}

/// What a successful payment produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// New ledger record.
    pub payment: Payment,
    /// Updated KPR, if it changed.
    pub kpr: Option<KprApplication>,
    /// Updated plan, if it changed.
    pub plan: Option<InstallmentPlan>,
}

impl PaymentOutcome {
    pub fn completed_kpr(&self) -> bool {
        self.kpr
            .as_ref()
            .is_some_and(|k| k.status == KprStatus::Completed)
    }
}

/// Checks that `kpr` can take payments and matches the request.
pub fn ensure_payable(kpr: &KprApplication, req: &ValidPayment) -> CoreResult<()> {
    if !kpr.status.accepts_payments() {
        return Err(CoreError::KprNotPayable {
            kpr_id: kpr.id.clone(),
            status: kpr.status.as_str().to_string(),
            required: "approved or completed",
        });
    }
    if let Some(booking_id) = &req.booking_id {
        if *booking_id != kpr.booking_id {
            return Err(ValidationError::inconsistent("booking_id", "does not match kpr").into());
        }
    }
    Ok(())
}

/// Applies `req` against `kpr` and its `plan`.
pub fn apply_payment(
    kpr: &KprApplication,
    plan: &InstallmentPlan,
    req: &ValidPayment,
    id: String,
    now: DateTime<Utc>,
) -> CoreResult<PaymentOutcome> {
    ensure_payable(kpr, req)?;

    let (kind, kpr_next, plan_next) = if req.installment_no == 0 {
        let remaining = kpr.price.dp_remaining();
        check_amount("dp", remaining, req.amount)?;

        let mut next = kpr.clone();
        next.price.dp_paid += req.amount;
        next.updated_at = now;
        (PaymentType::Dp, Some(next), None)
    } else {
        let mut next_plan = plan.clone();
        let line = next_plan
            .line_mut(req.installment_no)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "installment_no".to_string(),
            })?;
        let remaining = if line.status == ScheduleStatus::Paid {
            Money::zero()
        } else {
            line.remaining()
        };
        check_amount("installment", remaining, req.amount)?;

        line.paid_amount += req.amount;
        line.status = ScheduleStatus::for_amounts(line.amount, line.paid_amount);
        next_plan.updated_at = now;

        let kpr_next = if next_plan.all_paid() && kpr.status != KprStatus::Completed {
            let mut next = kpr.clone();
            next.status = KprStatus::Completed;
            next.updated_at = now;
            Some(next)
        } else {
            None
        };
        (PaymentType::Installment, kpr_next, Some(next_plan))
    };

    let payment = Payment {
        id,
        kind,
        kpr_id: kpr.id.clone(),
        booking_id: kpr.booking_id.clone(),
        installment_no: req.installment_no,
        amount: req.amount,
        paid_at: req.paid_at,
        method: req.method.clone(),
        reference: req.reference.clone(),
        notes: req.notes.clone(),
        created_at: now,
        bucket: None,
    };

    Ok(PaymentOutcome {
        payment,
        kpr: kpr_next,
        plan: plan_next,
    })
}

fn check_amount(target: &'static str, remaining: Money, amount: Money) -> CoreResult<()> {
    if !remaining.is_positive() {
        return Err(CoreError::AlreadyPaid(target));
    }
    if amount > remaining {
        return Err(CoreError::Overpayment { target, remaining });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
