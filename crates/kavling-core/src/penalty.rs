//! # Late Payment Penalties
//!
//! Penalties are computed, never stored on the schedule. Charging one appends
//! a `type = penalty` record to the payment ledger and nothing else.
//!
//! ## Formula
//! ```text
//! months_overdue(due, as_of) = 0                                  if as_of <= due
//!                            = month boundaries crossed + 1       otherwise
//!
//!   due 2025-02-05, as_of 2025-02-06  →  1
//!   due 2025-02-05, as_of 2025-04-06  →  3
//!
//! penalty = min(months × 50 000, round(amount × 10%))
//! ```
//!
//! ## Duplicate Prevention
//! At most one penalty per `(kpr_id, installment_no, bucket)` where the bucket
//! is the `YYYY-MM` month of `as_of`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::time::parse_date_or;
use crate::types::{InstallmentPlan, KprApplication, Payment, PaymentType, ScheduleLine, ScheduleStatus};
use crate::validation::required;

/// Flat fee per overdue month.
pub const PENALTY_FLAT_PER_MONTH: Money = Money::from_rupiah(50_000);

/// Cap as basis points of the installment amount (10%).
pub const PENALTY_CAP_BPS: u32 = 1_000;

/// Default `method` for penalty ledger entries.
pub const PENALTY_METHOD: &str = "internal";

pub fn months_overdue(due: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of <= due {
        return 0;
    }
    let months = (as_of.year() - due.year()) * 12 + as_of.month() as i32 - due.month() as i32 + 1;
    u32::try_from(months).unwrap_or(0)
}

pub fn days_overdue(due: NaiveDate, as_of: NaiveDate) -> i64 {
    if as_of <= due {
        return 0;
    }
    (as_of - due).num_days()
}

/// Penalty owed on an installment of `amount` that is `months` overdue.
///
/// ```rust
/// use kavling_core::penalty::penalty_for_installment;
/// use kavling_core::Money;
///
/// let amount = Money::from_rupiah(1_000_000);
/// assert_eq!(penalty_for_installment(amount, 1).rupiah(), 50_000);
/// assert_eq!(penalty_for_installment(amount, 3).rupiah(), 100_000);
/// assert!(penalty_for_installment(amount, 0).is_zero());
/// ```
pub fn penalty_for_installment(amount: Money, months: u32) -> Money {
    if months == 0 {
        return Money::zero();
    }
    let raw = PENALTY_FLAT_PER_MONTH * i64::from(months);
    let cap = amount.percent_bps(PENALTY_CAP_BPS).max(Money::zero());
    raw.min(cap)
}

/// `YYYY-MM` dedupe key.
pub fn month_bucket(as_of: NaiveDate) -> String {
    as_of.format("%Y-%m").to_string()
}

// =============================================================================
// Preview
// =============================================================================

/// One overdue line and the penalty it currently attracts.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PenaltyLine {
    pub installment_no: u32,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub amount: Money,
    pub paid_amount: Money,
    pub status: ScheduleStatus,
    pub days_overdue: i64,
    pub months_overdue: u32,
    pub penalty_due: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PenaltyPreview {
    pub kpr_id: String,
    #[ts(as = "String")]
    pub as_of: NaiveDate,
    pub bucket: String,
    pub total_penalty: Money,
    pub lines: Vec<PenaltyLine>,
}

/// Penalty line for `line`, if it is unpaid, overdue and the penalty is
/// non-zero.
pub fn overdue_line(line: &ScheduleLine, as_of: NaiveDate) -> Option<PenaltyLine> {
    if line.is_settled() {
        return None;
    }
    let months = months_overdue(line.due_date, as_of);
    let penalty = penalty_for_installment(line.amount, months);
    if penalty.is_zero() {
        return None;
    }
    Some(PenaltyLine {
        installment_no: line.no,
        due_date: line.due_date,
        amount: line.amount,
        paid_amount: line.paid_amount,
        status: line.status,
        days_overdue: days_overdue(line.due_date, as_of),
        months_overdue: months,
        penalty_due: penalty,
    })
}

/// Every overdue line of `plan` as of `as_of`, in schedule order.
pub fn overdue_lines(plan: &InstallmentPlan, as_of: NaiveDate) -> Vec<PenaltyLine> {
    let mut lines: Vec<PenaltyLine> = plan
        .schedule
        .iter()
        .filter_map(|l| overdue_line(l, as_of))
        .collect();
    lines.sort_by_key(|l| l.installment_no);
    lines
}

pub fn preview(plan: &InstallmentPlan, as_of: NaiveDate) -> PenaltyPreview {
    let lines = overdue_lines(plan, as_of);
    PenaltyPreview {
        kpr_id: plan.kpr_id.clone(),
        as_of,
        bucket: month_bucket(as_of),
        total_penalty: lines.iter().map(|l| l.penalty_due).sum(),
        lines,
    }
}

// =============================================================================
// Charge
// =============================================================================

/// Penalty charge body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PenaltyChargeInput {
    #[serde(default)]
    pub kpr_id: String,
    #[serde(default)]
    pub installment_no: i64,
    /// `YYYY-MM-DD`, defaults to today.
    #[serde(default)]
    pub as_of: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidCharge {
    pub kpr_id: String,
    pub installment_no: u32,
    pub as_of: NaiveDate,
    pub method: String,
    pub reference: String,
    pub notes: String,
}

impl PenaltyChargeInput {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<ValidCharge> {
        let kpr_id = required("kpr_id", &self.kpr_id)?;
        let installment_no = u32::try_from(self.installment_no)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ValidationError::inconsistent("installment_no", "must be >= 1"))?;
        let as_of = parse_date_or("as_of", Some(&self.as_of), today)?;
        let method = match self.method.trim() {
            "" => PENALTY_METHOD.to_string(),
            m => m.to_string(),
        };
        Ok(ValidCharge {
            kpr_id,
            installment_no,
            as_of,
            method,
            reference: self.reference.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

/// An approved charge: the amount and bucket to record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment<'a> {
    pub line: &'a ScheduleLine,
    pub amount: Money,
}

/// Decides whether installment `no` of `plan` can be charged as of `as_of`.
///
/// `payments` is the ledger; only penalty entries for the same KPR and line
/// are considered for the duplicate check.
pub fn assess_charge<'a, 'p, I>(
    plan: &'a InstallmentPlan,
    installment_no: u32,
    as_of: NaiveDate,
    payments: I,
) -> CoreResult<Assessment<'a>>
where
    I: IntoIterator<Item = &'p Payment>,
{
    let line = plan
        .line(installment_no)
        .ok_or_else(|| CoreError::not_found("installment", installment_no.to_string()))?;
    if line.is_settled() {
        return Err(CoreError::AlreadyPaid("installment"));
    }
    if as_of <= line.due_date {
        return Err(CoreError::NotOverdue { installment_no });
    }
    let amount = penalty_for_installment(line.amount, months_overdue(line.due_date, as_of));
    if amount.is_zero() {
        return Err(CoreError::ZeroPenalty { installment_no });
    }

    let bucket = month_bucket(as_of);
    let charged = payments.into_iter().any(|p| {
        p.kind == PaymentType::Penalty
            && p.kpr_id == plan.kpr_id
            && p.installment_no == installment_no
            && p.bucket.as_deref() == Some(bucket.as_str())
    });
    if charged {
        return Err(CoreError::PenaltyAlreadyCharged {
            kpr_id: plan.kpr_id.clone(),
            installment_no,
            bucket,
        });
    }

    Ok(Assessment { line, amount })
}

/// Ledger record for an assessed penalty.
pub fn build_penalty_payment(
    kpr: &KprApplication,
    req: &ValidCharge,
    amount: Money,
    id: String,
    now: DateTime<Utc>,
) -> Payment {
    Payment {
        id,
        kind: PaymentType::Penalty,
        kpr_id: kpr.id.clone(),
        booking_id: kpr.booking_id.clone(),
        installment_no: req.installment_no,
        amount,
        paid_at: now.date_naive(),
        method: req.method.clone(),
        reference: req.reference.clone(),
        notes: req.notes.clone(),
        created_at: now,
        bucket: Some(month_bucket(req.as_of)),
    }
}
