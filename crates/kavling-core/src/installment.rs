//! # Installment Schedule Generator
//!
//! Flat formula: the loan is split into `tenor_months` equal monthly lines.
//!
//! ## Due Dates
//! ```text
//! approved_at: 2025-01-20T10:00:00Z
//!                  │
//!                  ▼  next calendar month, day 5 (UTC)
//! line 1: 2025-02-05
//! line 2: 2025-03-05
//! ...
//! line N: first + (N-1) months
//! ```
//!
//! ## Rounding
//! Floor division gives every line the same share; the remainder (at most
//! `tenor_months - 1` rupiah) is added to the final line, so the schedule
//! always sums to exactly `loan_amount`.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InstallmentPlan, KprApplication, KprStatus, ScheduleLine, ScheduleStatus};

/// The only supported formula name.
pub const FLAT_FORMULA: &str = "flat";

/// Day of month every installment falls due.
pub const DUE_DAY: u32 = 5;

/// First due date: day 5 of the month after `approved_at`'s month (UTC).
pub fn first_due_date(approved_at: DateTime<Utc>) -> NaiveDate {
    let approved = approved_at.date_naive();
    let (year, month) = if approved.month() == 12 {
        (approved.year() + 1, 1)
    } else {
        (approved.year(), approved.month() + 1)
    };
    // Day 5 exists in every month.
    NaiveDate::from_ymd_opt(year, month, DUE_DAY).unwrap_or(approved)
}

/// Due date of line `no` (1-based).
pub fn due_date(first: NaiveDate, no: u32) -> NaiveDate {
    first
        .checked_add_months(Months::new(no.saturating_sub(1)))
        .unwrap_or(first)
}

/// Builds the schedule lines for `loan` over `tenor` months.
pub fn build_schedule(loan: Money, tenor: u32, first_due: NaiveDate) -> CoreResult<Vec<ScheduleLine>> {
    if !loan.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "loan_amount".to_string(),
        }
        .into());
    }
    let (share, remainder) = loan.split_even(tenor).ok_or_else(|| ValidationError::MustBePositive {
        field: "tenor_months".to_string(),
    })?;

    Ok((1..=tenor)
        .map(|no| ScheduleLine {
            no,
            due_date: due_date(first_due, no),
            amount: if no == tenor { share + remainder } else { share },
            paid_amount: Money::zero(),
            status: ScheduleStatus::Unpaid,
        })
        .collect())
}

/// Generates the plan for an approved KPR.
///
/// ## Rules
/// - the KPR must be approved
/// - at most one plan per KPR (`existing` is every stored plan)
/// - a KPR approved before `approved_at` was recorded falls back to `now`
pub fn generate_plan<'a, I>(
    kpr: &KprApplication,
    existing: I,
    id: String,
    now: DateTime<Utc>,
) -> CoreResult<InstallmentPlan>
where
    I: IntoIterator<Item = &'a InstallmentPlan>,
{
    if kpr.status != KprStatus::Approved {
        return Err(CoreError::KprNotPayable {
            kpr_id: kpr.id.clone(),
            status: kpr.status.as_str().to_string(),
            required: "approved",
        });
    }
    if existing.into_iter().any(|p| p.kpr_id == kpr.id) {
        return Err(CoreError::PlanAlreadyExists {
            kpr_id: kpr.id.clone(),
        });
    }

    let loan = kpr.price.loan_amount;
    let tenor = kpr.price.tenor_months;
    let first = first_due_date(kpr.approved_at.unwrap_or(now));
    let schedule = build_schedule(loan, tenor, first)?;
    let monthly = schedule.first().map(|l| l.amount).unwrap_or_default();

    Ok(InstallmentPlan {
        id,
        kpr_id: kpr.id.clone(),
        formula: FLAT_FORMULA.to_string(),
        loan_amount: loan,
        tenor_months: tenor,
        monthly_amount: monthly,
        schedule,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KprCustomer, KprPrice};
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn approved_kpr(loan: i64, tenor: u32) -> KprApplication {
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();
        KprApplication {
            id: "kpr_1".into(),
            booking_id: "bk_1".into(),
            site_id: "s".into(),
            subsite_id: "ss".into(),
            zone_id: "z".into(),
            customer: KprCustomer {
                name: "Budi".into(),
                ..Default::default()
            },
            price: KprPrice {
                loan_amount: Money::from_rupiah(loan),
                tenor_months: tenor,
                ..Default::default()
            },
            status: KprStatus::Approved,
            notes: String::new(),
            created_at: at,
            updated_at: at,
            approved_at: Some(at),
        }
    }

    const NO_PLANS: [&'static InstallmentPlan; 0] = [];

    #[test]
    fn test_first_due_date() {
        let jan = Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 0).unwrap();
        assert_eq!(first_due_date(jan), d(2025, 2, 5));
        let dec = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(first_due_date(dec), d(2026, 1, 5));
    }

    #[test]
    fn test_twelve_even_lines() {
        let now = Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap();
        let plan = generate_plan(&approved_kpr(12_000_000, 12), NO_PLANS, "plan_1".into(), now).unwrap();

        assert_eq!(plan.schedule.len(), 12);
        assert_eq!(plan.monthly_amount.rupiah(), 1_000_000);
        assert!(plan.schedule.iter().all(|l| l.amount.rupiah() == 1_000_000));
        assert!(plan.schedule.iter().all(|l| l.status == ScheduleStatus::Unpaid));
        assert_eq!(plan.schedule[0].due_date, d(2025, 2, 5));
        assert_eq!(plan.schedule[11].due_date, d(2026, 1, 5));
        let numbers: Vec<u32> = plan.schedule.iter().map(|l| l.no).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_remainder_goes_to_last_line() {
        let lines = build_schedule(Money::from_rupiah(10_000_000), 3, d(2025, 2, 5)).unwrap();
        let amounts: Vec<i64> = lines.iter().map(|l| l.amount.rupiah()).collect();
        assert_eq!(amounts, vec![3_333_333, 3_333_333, 3_333_334]);
    }

    #[test]
    fn test_schedule_sums_to_loan() {
        let mut seed: u64 = 42;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let loan = 1 + (seed >> 20) % 5_000_000_000;
            let tenor = 1 + ((seed >> 7) % 360) as u32;
            let lines = build_schedule(Money::from_rupiah(loan as i64), tenor, d(2025, 1, 5)).unwrap();
            assert_eq!(lines.len(), tenor as usize);
            let total: Money = lines.iter().map(|l| l.amount).sum();
            assert_eq!(total.rupiah(), loan as i64);
        }
    }

    #[test]
    fn test_rejects_non_approved_and_duplicates() {
        let now = Utc::now();
        let mut kpr = approved_kpr(12_000_000, 12);
        let plan = generate_plan(&kpr, NO_PLANS, "plan_1".into(), now).unwrap();
        let err = generate_plan(&kpr, [&plan], "plan_2".into(), now).unwrap_err();
        assert_eq!(err.to_string(), "installment plan already exists");

        kpr.status = KprStatus::Submitted;
        assert!(matches!(
            generate_plan(&kpr, NO_PLANS, "plan_3".into(), now),
            Err(CoreError::KprNotPayable { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_loan_or_tenor() {
        assert!(build_schedule(Money::zero(), 12, d(2025, 1, 5)).is_err());
        assert!(build_schedule(Money::from_rupiah(100), 0, d(2025, 1, 5)).is_err());
    }

    #[test]
    fn test_missing_approved_at_falls_back_to_now() {
        let mut kpr = approved_kpr(1_200, 12);
        kpr.approved_at = None;
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap();
        let plan = generate_plan(&kpr, NO_PLANS, "p".into(), now).unwrap();
        assert_eq!(plan.schedule[0].due_date, d(2025, 7, 5));
    }
}
