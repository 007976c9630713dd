//! Read-only reports. The KPR statement is public (redacted for guests);
//! the aggregates are admin-only.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use kavling_core::report::{KprStatement, Portfolio, ZoneSummary};
use kavling_store::Repositories;

use super::{blocking, Params};
use crate::auth::{Admin, Viewer};
use crate::error::ApiResult;
use crate::AppState;

pub async fn statement(
    State(state): State<AppState>,
    viewer: Viewer,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<KprStatement> {
    let Query(params) = query?;
    let kpr_id = params.kpr_id.unwrap_or_default();
    blocking(&state, move |store| {
        store
            .reports()
            .statement(&kpr_id, params.as_of.as_deref(), viewer.is_admin)
    })
    .await
}

pub async fn zone_summary(
    State(state): State<AppState>,
    _: Admin,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<ZoneSummary> {
    let Query(params) = query?;
    let zone_id = params.zone_id.unwrap_or_default();
    blocking(&state, move |store| store.reports().zone_summary(&zone_id)).await
}

pub async fn portfolio(State(state): State<AppState>, _: Admin) -> ApiResult<Portfolio> {
    blocking(&state, |store| store.reports().portfolio()).await
}
