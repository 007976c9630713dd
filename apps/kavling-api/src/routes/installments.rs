use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use kavling_core::InstallmentPlan;
use kavling_store::Repositories;

use super::{blocking, Params};
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::AppState;

/// `?kpr_id=`. The schedule comes back sorted by installment number.
pub async fn get_by_kpr(
    State(state): State<AppState>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<InstallmentPlan> {
    let Query(params) = query?;
    let kpr_id = params.kpr_id.unwrap_or_default();
    blocking(&state, move |store| store.installments().get_by_kpr(&kpr_id)).await
}

pub async fn generate(
    State(state): State<AppState>,
    _: Admin,
    Path(kpr_id): Path<String>,
) -> ApiResult<InstallmentPlan> {
    blocking(&state, move |store| store.installments().generate(&kpr_id)).await
}
