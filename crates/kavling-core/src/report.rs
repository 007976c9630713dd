//! # Reports
//!
//! Read-only folds over stored records. Nothing here mutates state or takes
//! a lock; callers pass in whatever snapshot they read.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────────┐
//! │ KprStatement     │ one KPR: customer, price, schedule, payments,        │
//! │                  │ overdue lines + late fees, progress                  │
//! ├──────────────────┼──────────────────────────────────────────────────────┤
//! │ ZoneSummary      │ one zone: booking counts, dp collected, principal    │
//! ├──────────────────┼──────────────────────────────────────────────────────┤
//! │ Portfolio        │ every booking and KPR: counts by status, money       │
//! └──────────────────┴──────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::penalty::{overdue_lines, PenaltyLine};
use crate::time::rfc3339;
use crate::types::{
    Booking, BookingStatus, InstallmentPlan, KprApplication, KprStatus, Payment, ScheduleLine, Site, Subsite,
    Zone,
};
use crate::views::{CustomerView, PaymentView};
use crate::Records;

// =============================================================================
// Statement
// =============================================================================

/// `{id, name}` reference; blank when the parent record is gone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

impl NamedRef {
    fn of(id: Option<&str>, name: Option<&str>) -> Self {
        NamedRef {
            id: id.unwrap_or_default().to_string(),
            name: name.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct StatementPrice {
    pub land_price: Money,
    pub dp_amount: Money,
    pub dp_paid: Money,
    pub loan_amount: Money,
    pub tenor_months: u32,
    pub monthly_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Progress {
    pub dp_remaining: Money,
    pub installments_paid_count: usize,
    pub installments_total: usize,
    pub principal_paid: Money,
    pub principal_remaining: Money,
    pub overall_status: KprStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BookingSummary {
    pub id: String,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct KprStatement {
    pub kpr_id: String,
    pub booking_id: String,
    pub customer: CustomerView,
    pub site: NamedRef,
    pub subsite: NamedRef,
    pub zone: NamedRef,
    pub price: StatementPrice,
    pub progress: Progress,
    pub late_fees_due: Money,
    pub overdue_installments: Vec<PenaltyLine>,
    pub schedule: Vec<ScheduleLine>,
    pub payments: Vec<PaymentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingSummary>,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
}

/// Everything a statement reads, already looked up by the caller.
#[derive(Debug, Clone, Copy)]
pub struct StatementSources<'a> {
    pub kpr: &'a KprApplication,
    pub plan: &'a InstallmentPlan,
    pub booking: Option<&'a Booking>,
    pub site: Option<&'a Site>,
    pub subsite: Option<&'a Subsite>,
    pub zone: Option<&'a Zone>,
}

/// Builds the statement for one KPR.
///
/// `payments` may contain other KPRs' records; they are filtered out and the
/// rest listed in ledger order.
pub fn kpr_statement<'p, I>(
    src: StatementSources<'_>,
    payments: I,
    as_of: NaiveDate,
    is_admin: bool,
    now: DateTime<Utc>,
) -> KprStatement
where
    I: IntoIterator<Item = &'p Payment>,
{
    let kpr = src.kpr;
    let mut plan = src.plan.clone();
    plan.sort_schedule();

    let mut ledger: Vec<&Payment> = payments.into_iter().filter(|p| p.kpr_id == kpr.id).collect();
    ledger.sort_by(|a, b| Payment::ledger_order(a, b));

    let overdue = overdue_lines(&plan, as_of);
    let principal_paid = plan.principal_paid();

    let monthly = if plan.monthly_amount.is_positive() {
        plan.monthly_amount
    } else {
        kpr.price
            .loan_amount
            .split_even(kpr.price.tenor_months)
            .map(|(share, _)| share)
            .unwrap_or_default()
    };

    KprStatement {
        kpr_id: kpr.id.clone(),
        booking_id: kpr.booking_id.clone(),
        customer: CustomerView::new(kpr, is_admin),
        site: NamedRef::of(src.site.map(|s| s.id.as_str()), src.site.map(|s| s.name.as_str())),
        subsite: NamedRef::of(src.subsite.map(|s| s.id.as_str()), src.subsite.map(|s| s.name.as_str())),
        zone: NamedRef::of(src.zone.map(|z| z.id.as_str()), src.zone.map(|z| z.name.as_str())),
        price: StatementPrice {
            land_price: kpr.price.land_price,
            dp_amount: kpr.price.dp_amount,
            dp_paid: kpr.price.dp_paid,
            loan_amount: kpr.price.loan_amount,
            tenor_months: kpr.price.tenor_months,
            monthly_amount: monthly,
        },
        progress: Progress {
            dp_remaining: kpr.price.dp_remaining(),
            installments_paid_count: plan.schedule.iter().filter(|l| l.is_settled()).count(),
            installments_total: plan.schedule.len(),
            principal_paid,
            principal_remaining: kpr.price.loan_amount.remaining_after(principal_paid),
            overall_status: kpr.status,
        },
        late_fees_due: overdue.iter().map(|l| l.penalty_due).sum(),
        overdue_installments: overdue,
        schedule: plan.schedule,
        payments: ledger.into_iter().map(|p| PaymentView::new(p, is_admin)).collect(),
        booking: src.booking.map(|b| BookingSummary {
            id: b.id.clone(),
            status: b.status,
            start_date: b.start_date,
            end_date: b.end_date,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }),
        generated_at: now,
    }
}

// =============================================================================
// Zone Summary / Portfolio
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct MoneyTotals {
    pub dp_collected: Money,
    pub principal_paid: Money,
    pub principal_outstanding: Money,
}

impl MoneyTotals {
    /// Adds one KPR. Without a plan the whole loan counts as outstanding.
    fn add(&mut self, kpr: &KprApplication, plan: Option<&InstallmentPlan>) {
        self.dp_collected += kpr.price.dp_paid;
        let paid = plan.map(InstallmentPlan::principal_paid).unwrap_or_default();
        self.principal_paid += paid;
        self.principal_outstanding += kpr.price.loan_amount.remaining_after(paid);
    }
}

fn plan_for<'a>(plans: &'a Records<InstallmentPlan>, kpr_id: &str) -> Option<&'a InstallmentPlan> {
    plans.values().find(|p| p.kpr_id == kpr_id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ZoneCounts {
    pub bookings_total: usize,
    pub bookings_confirmed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ZoneSummary {
    pub zone_id: String,
    pub counts: ZoneCounts,
    pub money: MoneyTotals,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
}

pub fn zone_summary(
    zone_id: &str,
    bookings: &Records<Booking>,
    kprs: &Records<KprApplication>,
    plans: &Records<InstallmentPlan>,
    now: DateTime<Utc>,
) -> ZoneSummary {
    let mut counts = ZoneCounts::default();
    let mut money = MoneyTotals::default();

    for booking in bookings.values().filter(|b| b.zone_id == zone_id) {
        counts.bookings_total += 1;
        if booking.status == BookingStatus::Confirmed {
            counts.bookings_confirmed += 1;
        }
        for kpr in kprs.values().filter(|k| k.booking_id == booking.id) {
            money.add(kpr, plan_for(plans, &kpr.id));
        }
    }

    ZoneSummary {
        zone_id: zone_id.to_string(),
        counts,
        money,
        generated_at: now,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PortfolioCounts {
    pub bookings_by_status: BTreeMap<String, usize>,
    pub kpr_by_status: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Portfolio {
    pub counts: PortfolioCounts,
    pub money: MoneyTotals,
    #[serde(with = "rfc3339")]
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
}

pub fn portfolio(
    bookings: &Records<Booking>,
    kprs: &Records<KprApplication>,
    plans: &Records<InstallmentPlan>,
    now: DateTime<Utc>,
) -> Portfolio {
    let mut counts = PortfolioCounts::default();
    let mut money = MoneyTotals::default();

    for booking in bookings.values() {
        *counts
            .bookings_by_status
            .entry(booking.status.as_str().to_string())
            .or_default() += 1;
    }
    for kpr in kprs.values() {
        *counts.kpr_by_status.entry(kpr.status.as_str().to_string()).or_default() += 1;
        money.add(kpr, plan_for(plans, &kpr.id));
    }

    Portfolio {
        counts,
        money,
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installment::generate_plan;
    use crate::types::{KprCustomer, KprPrice, PaymentType, ScheduleStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 6, 0, 0, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn booking(id: &str, zone: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.into(),
            site_id: "site_1".into(),
            subsite_id: "subsite_1".into(),
            zone_id: zone.into(),
            customer_name: "Budi".into(),
            customer_phone: String::new(),
            customer_email: String::new(),
            status,
            start_date: d(2025, 1, 10),
            end_date: d(2025, 1, 15),
            price: Money::zero(),
            notes: String::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn kpr(id: &str, booking_id: &str, dp_paid: i64) -> KprApplication {
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();
        KprApplication {
            id: id.into(),
            booking_id: booking_id.into(),
            site_id: "site_1".into(),
            subsite_id: "subsite_1".into(),
            zone_id: "zone_1".into(),
            customer: KprCustomer {
                name: "Budi".into(),
                nik: "3201".into(),
                ..Default::default()
            },
            price: KprPrice {
                land_price: Money::from_rupiah(20_000_000),
                dp_amount: Money::from_rupiah(5_000_000),
                dp_paid: Money::from_rupiah(dp_paid),
                loan_amount: Money::from_rupiah(3_000_000),
                tenor_months: 3,
                ..Default::default()
            },
            status: KprStatus::Approved,
            notes: String::new(),
            created_at: at,
            updated_at: at,
            approved_at: Some(at),
        }
    }

    fn paid_plan(k: &KprApplication, id: &str, paid_lines: &[u32]) -> InstallmentPlan {
        let none: [&InstallmentPlan; 0] = [];
        let mut plan = generate_plan(k, none, id.into(), now()).unwrap();
        for no in paid_lines {
            let line = plan.line_mut(*no).unwrap();
            line.paid_amount = line.amount;
            line.status = ScheduleStatus::Paid;
        }
        plan
    }

    fn records<T: crate::types::Record + Clone>(items: &[T]) -> Records<T> {
        items.iter().map(|r| (r.id().to_string(), r.clone())).collect()
    }

    #[test]
    fn test_statement_overdue_and_progress() {
        let k = kpr("kpr_1", "bk_1", 3_000_000);
        let plan = paid_plan(&k, "plan_1", &[2]);
        let b = booking("bk_1", "zone_1", BookingStatus::Confirmed);
        let site = Site {
            id: "site_1".into(),
            name: "Griya Asri".into(),
        };
        let payment = Payment {
            id: "pay_1".into(),
            kind: PaymentType::Dp,
            kpr_id: "kpr_1".into(),
            booking_id: "bk_1".into(),
            installment_no: 0,
            amount: Money::from_rupiah(3_000_000),
            paid_at: d(2025, 1, 25),
            method: "transfer".into(),
            reference: "TRX-1".into(),
            notes: String::new(),
            created_at: now(),
            bucket: None,
        };
        let mut other = payment.clone();
        other.id = "pay_2".into();
        other.kpr_id = "kpr_2".into();

        let src = StatementSources {
            kpr: &k,
            plan: &plan,
            booking: Some(&b),
            site: Some(&site),
            subsite: None,
            zone: None,
        };
        let st = kpr_statement(src, [&payment, &other], d(2025, 4, 6), false, now());

        assert_eq!(st.site.name, "Griya Asri");
        assert_eq!(st.subsite, NamedRef::default());
        assert!(st.customer.nik.is_none());
        assert_eq!(st.payments.len(), 1);
        assert!(st.payments[0].reference.is_none());

        // Lines 1 (due 02-05) and 3 (due 04-05) are overdue; line 2 is paid.
        let overdue: Vec<u32> = st.overdue_installments.iter().map(|l| l.installment_no).collect();
        assert_eq!(overdue, vec![1, 3]);
        assert_eq!(st.late_fees_due.rupiah(), 100_000 + 50_000);

        assert_eq!(st.progress.installments_paid_count, 1);
        assert_eq!(st.progress.installments_total, 3);
        assert_eq!(st.progress.principal_paid.rupiah(), 1_000_000);
        assert_eq!(st.progress.principal_remaining.rupiah(), 2_000_000);
        assert_eq!(st.progress.dp_remaining.rupiah(), 2_000_000);
        assert_eq!(st.price.monthly_amount.rupiah(), 1_000_000);

        let admin = kpr_statement(src, [&payment], d(2025, 4, 6), true, now());
        assert_eq!(admin.customer.nik.as_deref(), Some("3201"));
        assert_eq!(admin.payments[0].reference.as_deref(), Some("TRX-1"));
    }

    #[test]
    fn test_zone_summary_and_portfolio() {
        let bookings = records(&[
            booking("bk_1", "zone_1", BookingStatus::Confirmed),
            booking("bk_2", "zone_1", BookingStatus::Pending),
            booking("bk_3", "zone_2", BookingStatus::Confirmed),
        ]);
        let k1 = kpr("kpr_1", "bk_1", 5_000_000);
        let k3 = kpr("kpr_3", "bk_3", 1_000_000);
        let plans = records(&[paid_plan(&k1, "plan_1", &[1, 2])]);
        let kprs = records(&[k1, k3]);

        let zone = zone_summary("zone_1", &bookings, &kprs, &plans, now());
        assert_eq!(zone.counts.bookings_total, 2);
        assert_eq!(zone.counts.bookings_confirmed, 1);
        assert_eq!(zone.money.dp_collected.rupiah(), 5_000_000);
        assert_eq!(zone.money.principal_paid.rupiah(), 2_000_000);
        assert_eq!(zone.money.principal_outstanding.rupiah(), 1_000_000);

        let all = portfolio(&bookings, &kprs, &plans, now());
        assert_eq!(all.counts.bookings_by_status["confirmed"], 2);
        assert_eq!(all.counts.bookings_by_status["pending"], 1);
        assert_eq!(all.counts.kpr_by_status["approved"], 2);
        assert_eq!(all.money.dp_collected.rupiah(), 6_000_000);
        // kpr_3 has no plan: its whole loan is outstanding.
        assert_eq!(all.money.principal_outstanding.rupiah(), 1_000_000 + 3_000_000);
    }
}
