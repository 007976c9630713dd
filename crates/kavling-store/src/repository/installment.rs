//! Installment plans: one per approved KPR, generated once.

use chrono::Utc;
use kavling_core::installment::generate_plan;
use kavling_core::{CoreError, InstallmentPlan, KprApplication, ValidationError};
use tracing::info;

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{InstallmentPlans, KprApplications};
use crate::store::Snapshot;

#[derive(Debug)]
pub struct InstallmentRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> InstallmentRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        InstallmentRepository { store }
    }

    /// The plan for `kpr_id`, schedule sorted by installment number.
    pub fn get_by_kpr(&self, kpr_id: &str) -> StoreResult<InstallmentPlan> {
        let kpr_id = kpr_id.trim();
        if kpr_id.is_empty() {
            return Err(ValidationError::required("kpr_id").into());
        }
        let snapshot = self.store.snapshot()?;
        let mut plan = plan_for(&snapshot, kpr_id)?;
        plan.sort_schedule();
        Ok(plan)
    }
}

impl<S: WriteStore> InstallmentRepository<'_, S> {
    pub fn generate(&self, kpr_id: &str) -> StoreResult<InstallmentPlan> {
        let now = Utc::now();
        let session = self.store.begin(&[KprApplications, InstallmentPlans])?;
        let snapshot = session.snapshot();

        let kpr = snapshot.require::<KprApplication>(kpr_id)?;
        let existing = snapshot.records::<InstallmentPlan>();
        let plan = generate_plan(&kpr, existing.values(), ids::new_id(ids::PLAN, now), now)?;

        let write = session.with_record(&plan)?;
        session.commit(vec![write], now)?;
        info!(
            plan_id = %plan.id,
            kpr_id = %plan.kpr_id,
            tenor = plan.tenor_months,
            monthly = %plan.monthly_amount,
            "Installment plan generated"
        );
        Ok(plan)
    }
}

/// The plan belonging to `kpr_id`, or `NotFound("installment plan")`.
pub(crate) fn plan_for(snapshot: &Snapshot, kpr_id: &str) -> StoreResult<InstallmentPlan> {
    snapshot
        .records::<InstallmentPlan>()
        .into_values()
        .find(|p| p.kpr_id == kpr_id)
        .ok_or_else(|| CoreError::not_found("installment plan", kpr_id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{approved_kpr, confirmed_booking, hierarchy, store};
    use crate::repository::Repositories;
    use crate::StoreError;
    use kavling_core::kpr::KprCreateInput;
    use kavling_core::{ErrorKind, Money, ScheduleStatus};

    #[test]
    fn test_generate_once_for_approved_kpr() {
        let (_dir, store) = store();
        hierarchy(&store);
        confirmed_booking(&store, "bk_1");
        let kpr = approved_kpr(&store, "bk_1");

        let plan = store.installments().generate(&kpr.id).unwrap();
        assert_eq!(plan.schedule.len(), 3);
        assert_eq!(plan.monthly_amount, Money::from_rupiah(1_000_000));
        assert!(plan.schedule.iter().all(|l| l.status == ScheduleStatus::Unpaid));

        assert!(matches!(
            store.installments().generate(&kpr.id).unwrap_err(),
            StoreError::Core(CoreError::PlanAlreadyExists { .. })
        ));

        let stored = store.installments().get_by_kpr(&kpr.id).unwrap();
        assert_eq!(stored.schedule.iter().map(|l| l.no).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn test_generate_requires_approval() {
        let (_dir, store) = store();
        hierarchy(&store);
        confirmed_booking(&store, "bk_1");
        let draft = store
            .kprs()
            .create(&KprCreateInput {
                booking_id: "bk_1".into(),
                notes: String::new(),
            })
            .unwrap();

        let err = store.installments().generate(&draft.id).unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::KprNotPayable { .. })));
        assert_eq!(store.installments().generate("kpr_9").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.installments().get_by_kpr(&draft.id).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
