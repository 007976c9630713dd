//! Payment ledger. Both routes are admin-only.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use kavling_core::payment::PaymentInput;
use kavling_core::{KprStatus, Payment};
use kavling_store::Repositories;
use serde::Serialize;

use super::{blocking, Params};
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::AppState;

/// Response to an applied payment.
#[derive(Debug, Serialize)]
pub struct PaymentApplied {
    pub id: String,
    pub payment: Payment,
    /// KPR status after the payment, when the payment changed the KPR.
    pub kpr_status: Option<KprStatus>,
    pub kpr_completed: bool,
}

/// `?kpr_id=` or `?booking_id=`; at least one is required.
pub async fn list(
    State(state): State<AppState>,
    _: Admin,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<Vec<Payment>> {
    let Query(params) = query?;
    blocking(&state, move |store| {
        store
            .payments()
            .list(params.kpr_id.as_deref(), params.booking_id.as_deref())
    })
    .await
}

pub async fn apply(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<PaymentInput>, JsonRejection>,
) -> ApiResult<PaymentApplied> {
    let Json(input) = body?;
    blocking(&state, move |store| {
        let outcome = store.payments().apply(&input)?;
        Ok(PaymentApplied {
            id: outcome.payment.id.clone(),
            kpr_status: outcome.kpr.as_ref().map(|k| k.status),
            kpr_completed: outcome.completed_kpr(),
            payment: outcome.payment,
        })
    })
    .await
}
