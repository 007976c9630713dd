use axum::extract::State;
use kavling_core::reconcile::ReconcileSummary;
use kavling_store::Repositories;

use super::blocking;
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::AppState;

/// Replays the payment ledger over plans and KPRs; see `Reconciler::run`.
pub async fn run(State(state): State<AppState>, _: Admin) -> ApiResult<ReconcileSummary> {
    blocking(&state, |store| store.reconciler().run()).await
}
