//! Sites, subsites and zones. Reads are public; writes need the admin token.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use kavling_core::hierarchy::{SiteInput, SubsiteInput, ZoneInput};
use kavling_core::{Site, Subsite, Zone};
use kavling_store::{Deleted, Repositories};

use super::{blocking, Params};
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::AppState;

// =============================================================================
// Sites
// =============================================================================

pub async fn list_sites(State(state): State<AppState>) -> ApiResult<Vec<Site>> {
    blocking(&state, |store| store.hierarchy().sites()).await
}

pub async fn create_site(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<SiteInput>, JsonRejection>,
) -> ApiResult<Site> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().create_site(&input)).await
}

pub async fn update_site(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    body: Result<Json<SiteInput>, JsonRejection>,
) -> ApiResult<Site> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().update_site(&id, &input)).await
}

pub async fn delete_site(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<Deleted> {
    blocking(&state, move |store| store.hierarchy().delete_site(&id)).await
}

// =============================================================================
// Subsites
// =============================================================================

/// `?site_id=` narrows the list to one site.
pub async fn list_subsites(
    State(state): State<AppState>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<Vec<Subsite>> {
    let Query(params) = query?;
    blocking(&state, move |store| store.hierarchy().subsites(params.site_id.as_deref())).await
}

pub async fn create_subsite(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<SubsiteInput>, JsonRejection>,
) -> ApiResult<Subsite> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().create_subsite(&input)).await
}

pub async fn update_subsite(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    body: Result<Json<SubsiteInput>, JsonRejection>,
) -> ApiResult<Subsite> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().update_subsite(&id, &input)).await
}

pub async fn delete_subsite(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<Deleted> {
    blocking(&state, move |store| store.hierarchy().delete_subsite(&id)).await
}

// =============================================================================
// Zones
// =============================================================================

/// `?subsite_id=` narrows the list to one subsite.
pub async fn list_zones(
    State(state): State<AppState>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<Vec<Zone>> {
    let Query(params) = query?;
    blocking(&state, move |store| store.hierarchy().zones(params.subsite_id.as_deref())).await
}

pub async fn create_zone(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<ZoneInput>, JsonRejection>,
) -> ApiResult<Zone> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().create_zone(&input)).await
}

pub async fn update_zone(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    body: Result<Json<ZoneInput>, JsonRejection>,
) -> ApiResult<Zone> {
    let Json(input) = body?;
    blocking(&state, move |store| store.hierarchy().update_zone(&id, &input)).await
}

pub async fn delete_zone(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<Deleted> {
    blocking(&state, move |store| store.hierarchy().delete_zone(&id)).await
}
