//! KPR applications and their status transitions.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use kavling_core::kpr::{KprCreateInput, KprUpdateInput};
use kavling_core::views::KprView;
use kavling_core::KprApplication;
use kavling_store::Repositories;

use super::{blocking, Params};
use crate::auth::{Admin, Viewer};
use crate::error::ApiResult;
use crate::AppState;

/// `?booking_id=`. Guests do not see NIK, address or price.
pub async fn get_by_booking(
    State(state): State<AppState>,
    viewer: Viewer,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<KprView> {
    let Query(params) = query?;
    let booking_id = params.booking_id.unwrap_or_default();
    blocking(&state, move |store| store.kprs().get_by_booking(&booking_id, viewer.is_admin)).await
}

pub async fn create(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<KprCreateInput>, JsonRejection>,
) -> ApiResult<KprApplication> {
    let Json(input) = body?;
    blocking(&state, move |store| store.kprs().create(&input)).await
}

pub async fn update(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    body: Result<Json<KprUpdateInput>, JsonRejection>,
) -> ApiResult<KprApplication> {
    let Json(input) = body?;
    blocking(&state, move |store| store.kprs().update(&id, &input)).await
}

pub async fn submit(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<KprApplication> {
    blocking(&state, move |store| store.kprs().submit(&id)).await
}

pub async fn approve(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<KprApplication> {
    blocking(&state, move |store| store.kprs().approve(&id)).await
}

pub async fn reject(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<KprApplication> {
    blocking(&state, move |store| store.kprs().reject(&id)).await
}

pub async fn cancel(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<KprApplication> {
    blocking(&state, move |store| store.kprs().cancel(&id)).await
}
