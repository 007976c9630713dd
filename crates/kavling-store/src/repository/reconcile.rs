//! Ledger replay over stored plans and KPRs.
//!
//! Runs after startup load and on demand. Repairs are written plans first,
//! then KPRs, matching the payment write order.

use chrono::Utc;
use kavling_core::reconcile::{reconcile, ReconcileSummary};
use kavling_core::{InstallmentPlan, KprApplication, Payment};
use tracing::{info, warn};

use crate::capability::WriteStore;
use crate::collection::Collection;
use crate::error::StoreResult;
use crate::names::CollectionName::{self, InstallmentPlans, KprApplications, Payments};

#[derive(Debug)]
pub struct Reconciler<'a, S> {
    store: &'a S,
}

impl<'a, S> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Reconciler { store }
    }
}

impl<S: WriteStore> Reconciler<'_, S> {
    pub fn run(&self) -> StoreResult<ReconcileSummary> {
        let now = Utc::now();
        let session = self.store.begin(&[KprApplications, InstallmentPlans, Payments])?;
        let snapshot = session.snapshot();

        let kprs = snapshot.records::<KprApplication>();
        let plans = snapshot.records::<InstallmentPlan>();
        let payments = snapshot.records::<Payment>();
        let result = reconcile(kprs.values(), plans.values(), payments.values(), now);

        for d in &result.discrepancies {
            warn!(
                kpr_id = %d.kpr_id,
                installment_no = d.installment_no,
                ledger = %d.ledger,
                recorded = %d.recorded,
                "Derived state ahead of payment ledger"
            );
        }
        let summary = ReconcileSummary::from(&result);
        if result.is_clean() {
            return Ok(summary);
        }

        let mut writes: Vec<(CollectionName, Collection)> = Vec::new();
        if !result.plans.is_empty() {
            let mut c = session.working_copy(InstallmentPlans)?;
            for plan in &result.plans {
                c.put(plan)?;
            }
            writes.push((InstallmentPlans, c));
        }
        if !result.kprs.is_empty() {
            let mut c = session.working_copy(KprApplications)?;
            for kpr in &result.kprs {
                c.put(kpr)?;
            }
            writes.push((KprApplications, c));
        }
        session.commit(writes, now)?;

        info!(
            plans = ?summary.repaired_plans,
            kprs = ?summary.repaired_kprs,
            "Derived state repaired from payment ledger"
        );
        Ok(summary)
    }
}
