//! Late fee preview and charge. Admin-only.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use kavling_core::penalty::{PenaltyChargeInput, PenaltyPreview};
use kavling_core::Money;
use kavling_store::Repositories;
use serde::Serialize;

use super::{blocking, Params};
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PenaltyCharged {
    pub id: String,
    pub amount: Money,
    pub bucket: Option<String>,
}

/// `?kpr_id=&as_of=YYYY-MM-DD`; `as_of` defaults to today.
pub async fn preview(
    State(state): State<AppState>,
    _: Admin,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<PenaltyPreview> {
    let Query(params) = query?;
    let kpr_id = params.kpr_id.unwrap_or_default();
    blocking(&state, move |store| store.penalties().preview(&kpr_id, params.as_of.as_deref())).await
}

pub async fn charge(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<PenaltyChargeInput>, JsonRejection>,
) -> ApiResult<PenaltyCharged> {
    let Json(input) = body?;
    blocking(&state, move |store| {
        let payment = store.penalties().charge(&input)?;
        Ok(PenaltyCharged {
            id: payment.id,
            amount: payment.amount,
            bucket: payment.bucket,
        })
    })
    .await
}
