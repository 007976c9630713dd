//! Bookings and zone availability.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use kavling_core::booking::{Availability, BookingInput};
use kavling_core::views::BookingView;
use kavling_core::Booking;
use kavling_store::Repositories;

use super::{blocking, Params};
use crate::auth::{Admin, Viewer};
use crate::error::ApiResult;
use crate::AppState;

/// `?zone_id=` is required. Guests get customer contact details stripped.
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<Vec<BookingView>> {
    let Query(params) = query?;
    let zone_id = params.zone_id.unwrap_or_default();
    blocking(&state, move |store| store.bookings().list(&zone_id, viewer.is_admin)).await
}

pub async fn availability(
    State(state): State<AppState>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResult<Availability> {
    let Query(params) = query?;
    blocking(&state, move |store| {
        store.bookings().availability(
            params.zone_id.as_deref().unwrap_or_default(),
            params.from.as_deref().unwrap_or_default(),
            params.to.as_deref().unwrap_or_default(),
        )
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    _: Admin,
    body: Result<Json<BookingInput>, JsonRejection>,
) -> ApiResult<Booking> {
    let Json(input) = body?;
    blocking(&state, move |store| store.bookings().create(&input)).await
}

pub async fn update(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    body: Result<Json<BookingInput>, JsonRejection>,
) -> ApiResult<Booking> {
    let Json(input) = body?;
    blocking(&state, move |store| store.bookings().update(&id, &input)).await
}

/// `DELETE /bookings/{id}` cancels; the record is kept.
pub async fn cancel(State(state): State<AppState>, _: Admin, Path(id): Path<String>) -> ApiResult<Booking> {
    blocking(&state, move |store| store.bookings().cancel(&id)).await
}
