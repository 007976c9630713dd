//! # Payment Repository
//!
//! ```text
//! apply(input)       locks: kpr_applications, installment_plans, payments
//!     │
//!     ▼  kavling_core::payment::apply_payment
//! PaymentOutcome { payment, plan?, kpr? }
//!     │
//!     ▼  write order is fixed
//! payments.json ─► installment_plans.json ─► kpr_applications.json ─► merge
//!   (always)          (installment only)       (dp, or completed)
//! ```
//!
//! The ledger goes first. If the process dies after it, the derived plan and
//! KPR lag behind the ledger and the next reconcile pass brings them up.

use chrono::Utc;
use kavling_core::payment::{apply_payment, PaymentInput, PaymentOutcome};
use kavling_core::{KprApplication, Payment, ValidationError};
use tracing::info;

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{InstallmentPlans, KprApplications, Payments};
use crate::repository::installment::plan_for;

#[derive(Debug)]
pub struct PaymentRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> PaymentRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        PaymentRepository { store }
    }

    /// Ledger entries for a KPR or a booking, oldest first.
    pub fn list(&self, kpr_id: Option<&str>, booking_id: Option<&str>) -> StoreResult<Vec<Payment>> {
        let kpr_id = kpr_id.map(str::trim).filter(|s| !s.is_empty());
        let booking_id = booking_id.map(str::trim).filter(|s| !s.is_empty());
        if kpr_id.is_none() && booking_id.is_none() {
            return Err(ValidationError::required("kpr_id or booking_id").into());
        }

        let mut payments: Vec<Payment> = self
            .store
            .snapshot()?
            .records::<Payment>()
            .into_values()
            .filter(|p| kpr_id.map_or(true, |id| p.kpr_id == id))
            .filter(|p| booking_id.map_or(true, |id| p.booking_id == id))
            .collect();
        payments.sort_by(Payment::ledger_order);
        Ok(payments)
    }
}

impl<S: WriteStore> PaymentRepository<'_, S> {
    pub fn apply(&self, input: &PaymentInput) -> StoreResult<PaymentOutcome> {
        let now = Utc::now();
        let req = input.validate(now.date_naive())?;

        let session = self.store.begin(&[KprApplications, InstallmentPlans, Payments])?;
        let snapshot = session.snapshot();
        let kpr = snapshot.require::<KprApplication>(&req.kpr_id)?;
        let plan = plan_for(snapshot, &req.kpr_id)?;

        let outcome = apply_payment(&kpr, &plan, &req, ids::new_id(ids::PAYMENT, now), now)?;

        let mut writes = vec![session.with_record(&outcome.payment)?];
        if let Some(plan) = &outcome.plan {
            writes.push(session.with_record(plan)?);
        }
        if let Some(kpr) = &outcome.kpr {
            writes.push(session.with_record(kpr)?);
        }
        session.commit(writes, now)?;

        info!(
            payment_id = %outcome.payment.id,
            kpr_id = %req.kpr_id,
            installment_no = req.installment_no,
            amount = %req.amount,
            "Payment recorded"
        );
        if outcome.completed_kpr() {
            info!(kpr_id = %req.kpr_id, "KPR completed");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{approved_kpr, confirmed_booking, hierarchy, store};
    use crate::repository::Repositories;
    use crate::StoreError;
    use crate::store::EntityStore;
    use kavling_core::{CoreError, ErrorKind, KprStatus, Money, PaymentType, ScheduleStatus};
    use std::thread;

    fn pay(kpr_id: &str, no: i64, amount: i64) -> PaymentInput {
        PaymentInput {
            kpr_id: kpr_id.into(),
            installment_no: no,
            amount: Money::from_rupiah(amount),
            method: "transfer".into(),
            ..Default::default()
        }
    }

    fn ready(store: &EntityStore) -> String {
        hierarchy(store);
        confirmed_booking(store, "bk_1");
        let kpr = approved_kpr(store, "bk_1");
        store.installments().generate(&kpr.id).unwrap();
        kpr.id
    }

    #[test]
    fn test_dp_payments_and_overpayment() {
        let (_dir, store) = store();
        let kpr_id = ready(&store);
        let payments = store.payments();

        let outcome = payments.apply(&pay(&kpr_id, 0, 15_000_000)).unwrap();
        assert_eq!(outcome.payment.kind, PaymentType::Dp);
        assert!(outcome.plan.is_none());
        assert_eq!(store.kprs().get(&kpr_id).unwrap().price.dp_paid, Money::from_rupiah(15_000_000));

        let err = payments.apply(&pay(&kpr_id, 0, 6_000_000)).unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Overpayment { .. })));

        payments.apply(&pay(&kpr_id, 0, 5_000_000)).unwrap();
        let err = payments.apply(&pay(&kpr_id, 0, 1)).unwrap_err();
        assert_eq!(err.to_string(), "dp already fully paid");
        assert_eq!(payments.list(Some(&kpr_id), None).unwrap().len(), 2);
    }

    #[test]
    fn test_installments_complete_the_kpr() {
        let (_dir, store) = store();
        let kpr_id = ready(&store);
        let payments = store.payments();

        payments.apply(&pay(&kpr_id, 1, 400_000)).unwrap();
        let plan = store.installments().get_by_kpr(&kpr_id).unwrap();
        assert_eq!(plan.schedule[0].status, ScheduleStatus::Partial);

        payments.apply(&pay(&kpr_id, 1, 600_000)).unwrap();
        payments.apply(&pay(&kpr_id, 2, 1_000_000)).unwrap();
        let last = payments.apply(&pay(&kpr_id, 3, 1_000_000)).unwrap();
        assert!(last.completed_kpr());
        assert_eq!(store.kprs().get(&kpr_id).unwrap().status, KprStatus::Completed);

        // Completed KPRs still accept down payment.
        payments.apply(&pay(&kpr_id, 0, 1_000)).unwrap();

        let err = payments.apply(&pay(&kpr_id, 4, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let by_booking = payments.list(None, Some("bk_1")).unwrap();
        assert_eq!(by_booking.len(), 5);
        assert_eq!(payments.list(None, None).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_requires_plan_and_matching_booking() {
        let (_dir, store) = store();
        hierarchy(&store);
        confirmed_booking(&store, "bk_1");
        let kpr = approved_kpr(&store, "bk_1");

        let err = store.payments().apply(&pay(&kpr.id, 0, 1)).unwrap_err();
        assert_eq!(err.to_string(), format!("installment plan not found: {}", kpr.id));

        store.installments().generate(&kpr.id).unwrap();
        let mut input = pay(&kpr.id, 0, 1);
        input.booking_id = "bk_other".into();
        assert_eq!(store.payments().apply(&input).unwrap_err().kind(), ErrorKind::Validation);
    }

    /// Concurrent payments on one line never push it past its amount, and
    /// every accepted payment is reflected in the line.
    #[test]
    fn test_concurrent_payments_never_overpay() {
        let (_dir, store) = store();
        let kpr_id = ready(&store);

        thread::scope(|s| {
            for _ in 0..6 {
                let (store, kpr_id) = (&store, &kpr_id);
                s.spawn(move || {
                    let _ = store.payments().apply(&pay(kpr_id, 1, 300_000));
                });
            }
        });

        let plan = store.installments().get_by_kpr(&kpr_id).unwrap();
        let ledger: Money = store
            .payments()
            .list(Some(&kpr_id), None)
            .unwrap()
            .iter()
            .map(|p| p.amount)
            .sum();
        assert_eq!(ledger, plan.schedule[0].paid_amount);
        assert_eq!(ledger, Money::from_rupiah(900_000));
        assert!(plan.schedule[0].paid_amount <= plan.schedule[0].amount);
    }
}
