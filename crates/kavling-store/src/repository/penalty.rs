//! # Penalty Repository
//!
//! Late fees are ledger entries of type `penalty`. Charging never touches the
//! plan or the KPR, and at most one penalty exists per
//! `(kpr, installment, YYYY-MM)` month bucket.

use chrono::Utc;
use kavling_core::penalty::{assess_charge, build_penalty_payment, preview, PenaltyChargeInput, PenaltyPreview};
use kavling_core::time::parse_date_or;
use kavling_core::{KprApplication, Payment, ValidationError};
use tracing::info;

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{InstallmentPlans, KprApplications, Payments};
use crate::repository::installment::plan_for;

#[derive(Debug)]
pub struct PenaltyRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> PenaltyRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        PenaltyRepository { store }
    }

    /// Overdue lines and what charging each would cost as of `as_of`
    /// (default today).
    pub fn preview(&self, kpr_id: &str, as_of: Option<&str>) -> StoreResult<PenaltyPreview> {
        let kpr_id = kpr_id.trim();
        if kpr_id.is_empty() {
            return Err(ValidationError::required("kpr_id").into());
        }
        let as_of = parse_date_or("as_of", as_of, Utc::now().date_naive())?;

        let snapshot = self.store.snapshot()?;
        snapshot.require::<KprApplication>(kpr_id)?;
        let plan = plan_for(&snapshot, kpr_id)?;
        Ok(preview(&plan, as_of))
    }
}

impl<S: WriteStore> PenaltyRepository<'_, S> {
    pub fn charge(&self, input: &PenaltyChargeInput) -> StoreResult<Payment> {
        let now = Utc::now();
        let req = input.validate(now.date_naive())?;

        let session = self.store.begin(&[KprApplications, InstallmentPlans, Payments])?;
        let snapshot = session.snapshot();
        let kpr = snapshot.require::<KprApplication>(&req.kpr_id)?;
        let plan = plan_for(snapshot, &req.kpr_id)?;
        let ledger = snapshot.records::<Payment>();

        let assessment = assess_charge(&plan, req.installment_no, req.as_of, ledger.values())?;
        let payment = build_penalty_payment(&kpr, &req, assessment.amount, ids::new_id(ids::PENALTY, now), now);

        let write = session.with_record(&payment)?;
        session.commit(vec![write], now)?;
        info!(
            payment_id = %payment.id,
            kpr_id = %payment.kpr_id,
            installment_no = payment.installment_no,
            amount = %payment.amount,
            bucket = payment.bucket.as_deref().unwrap_or_default(),
            "Penalty charged"
        );
        Ok(payment)
    }
}
