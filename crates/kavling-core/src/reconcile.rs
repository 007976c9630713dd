//! # Ledger Reconciliation
//!
//! The payment ledger is the source of truth for `dp_paid`, each schedule
//! line's `paid_amount`/`status`, and the derived `completed` KPR status.
//! A payment writes three files in a fixed order:
//!
//! ```text
//! payments.json ──► installment_plans.json ──► kpr_applications.json
//!      (1)                   (2)                        (3)
//! ```
//!
//! A crash between (1) and (3) leaves the ledger ahead of the derived state.
//! That is the only gap this pass repairs. Derived state that is ahead of
//! the ledger cannot come from an interrupted write; it is reported and left
//! alone.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{InstallmentPlan, KprApplication, KprStatus, Payment, PaymentType, ScheduleStatus};

/// Derived value that disagrees with the ledger in a way replay cannot fix.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Discrepancy {
    pub kpr_id: String,
    /// 0 for the down payment.
    pub installment_no: u32,
    pub ledger: Money,
    pub recorded: Money,
}

/// Result of one replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// KPRs whose `dp_paid` or status was repaired.
    pub kprs: Vec<KprApplication>,
    /// Plans with at least one repaired line.
    pub plans: Vec<InstallmentPlan>,
    pub discrepancies: Vec<Discrepancy>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.kprs.is_empty() && self.plans.is_empty()
    }
}

/// Summary returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ReconcileSummary {
    pub repaired_kprs: Vec<String>,
    pub repaired_plans: Vec<String>,
    pub discrepancies: Vec<Discrepancy>,
}

impl From<&Reconciliation> for ReconcileSummary {
    fn from(r: &Reconciliation) -> Self {
        ReconcileSummary {
            repaired_kprs: r.kprs.iter().map(|k| k.id.clone()).collect(),
            repaired_plans: r.plans.iter().map(|p| p.id.clone()).collect(),
            discrepancies: r.discrepancies.clone(),
        }
    }
}

/// Sums of dp / installment payments, keyed by `(kpr_id, installment_no)`.
/// Penalties are excluded: they never touch derived state.
fn ledger_totals<'a, I>(payments: I) -> BTreeMap<(String, u32), Money>
where
    I: IntoIterator<Item = &'a Payment>,
{
    let mut totals = BTreeMap::new();
    for p in payments {
        let no = match p.kind {
            PaymentType::Dp => 0,
            PaymentType::Installment => p.installment_no,
            PaymentType::Penalty => continue,
        };
        *totals.entry((p.kpr_id.clone(), no)).or_insert_with(Money::zero) += p.amount;
    }
    totals
}

/// Replays `payments` over `kprs` and `plans`.
pub fn reconcile<'a, K, P, L>(kprs: K, plans: P, payments: L, now: DateTime<Utc>) -> Reconciliation
where
    K: IntoIterator<Item = &'a KprApplication>,
    P: IntoIterator<Item = &'a InstallmentPlan>,
    L: IntoIterator<Item = &'a Payment>,
{
    let totals = ledger_totals(payments);
    let ledger = |kpr_id: &str, no: u32| {
        totals
            .get(&(kpr_id.to_string(), no))
            .copied()
            .unwrap_or_default()
    };

    let mut out = Reconciliation::default();
    let mut settled: BTreeMap<String, bool> = BTreeMap::new();

    for plan in plans {
        let mut next = plan.clone();
        let mut changed = false;
        for line in next.schedule.iter_mut() {
            let paid = ledger(&plan.kpr_id, line.no);
            if paid > line.paid_amount {
                line.paid_amount = paid;
                line.status = ScheduleStatus::for_amounts(line.amount, paid);
                changed = true;
            } else if paid < line.paid_amount {
                out.discrepancies.push(Discrepancy {
                    kpr_id: plan.kpr_id.clone(),
                    installment_no: line.no,
                    ledger: paid,
                    recorded: line.paid_amount,
                });
            }
        }
        settled.insert(plan.kpr_id.clone(), next.all_paid());
        if changed {
            next.updated_at = now;
            out.plans.push(next);
        }
    }

    for kpr in kprs {
        let mut next = kpr.clone();
        let paid = ledger(&kpr.id, 0);
        if paid > kpr.price.dp_paid {
            next.price.dp_paid = paid;
        } else if paid < kpr.price.dp_paid {
            out.discrepancies.push(Discrepancy {
                kpr_id: kpr.id.clone(),
                installment_no: 0,
                ledger: paid,
                recorded: kpr.price.dp_paid,
            });
        }
        if kpr.status == KprStatus::Approved && settled.get(&kpr.id).copied().unwrap_or(false) {
            next.status = KprStatus::Completed;
        }
        if next != *kpr {
            next.updated_at = now;
            out.kprs.push(next);
        }
    }

    out
}
