//! Read-only reports. Every report is built from one snapshot, so its
//! figures are mutually consistent.

use chrono::Utc;
use kavling_core::report::{kpr_statement, portfolio, zone_summary, KprStatement, Portfolio, StatementSources, ZoneSummary};
use kavling_core::time::parse_date_or;
use kavling_core::{Booking, InstallmentPlan, KprApplication, Payment, Site, Subsite, ValidationError, Zone};
use tracing::debug;

use crate::capability::ReadStore;
use crate::error::StoreResult;
use crate::repository::installment::plan_for;

#[derive(Debug)]
pub struct ReportRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> ReportRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        ReportRepository { store }
    }

    /// Statement for one KPR. Requires a generated plan.
    pub fn statement(&self, kpr_id: &str, as_of: Option<&str>, is_admin: bool) -> StoreResult<KprStatement> {
        let kpr_id = kpr_id.trim();
        if kpr_id.is_empty() {
            return Err(ValidationError::required("kpr_id").into());
        }
        let now = Utc::now();
        let as_of = parse_date_or("as_of", as_of, now.date_naive())?;

        let snapshot = self.store.snapshot()?;
        let kpr = snapshot.require::<KprApplication>(kpr_id)?;
        let plan = plan_for(&snapshot, kpr_id)?;
        let booking = snapshot.get::<Booking>(&kpr.booking_id)?;
        let site = snapshot.get::<Site>(&kpr.site_id)?;
        let subsite = snapshot.get::<Subsite>(&kpr.subsite_id)?;
        let zone = snapshot.get::<Zone>(&kpr.zone_id)?;
        let payments = snapshot.records::<Payment>();

        let src = StatementSources {
            kpr: &kpr,
            plan: &plan,
            booking: booking.as_ref(),
            site: site.as_ref(),
            subsite: subsite.as_ref(),
            zone: zone.as_ref(),
        };
        debug!(kpr_id = %kpr_id, as_of = %as_of, "Building statement");
        Ok(kpr_statement(src, payments.values(), as_of, is_admin, now))
    }

    pub fn zone_summary(&self, zone_id: &str) -> StoreResult<ZoneSummary> {
        let zone_id = zone_id.trim();
        if zone_id.is_empty() {
            return Err(ValidationError::required("zone_id").into());
        }
        let snapshot = self.store.snapshot()?;
        Ok(zone_summary(
            zone_id,
            &snapshot.records::<Booking>(),
            &snapshot.records::<KprApplication>(),
            &snapshot.records::<InstallmentPlan>(),
            Utc::now(),
        ))
    }

    pub fn portfolio(&self) -> StoreResult<Portfolio> {
        let snapshot = self.store.snapshot()?;
        Ok(portfolio(
            &snapshot.records::<Booking>(),
            &snapshot.records::<KprApplication>(),
            &snapshot.records::<InstallmentPlan>(),
            Utc::now(),
        ))
    }
}
