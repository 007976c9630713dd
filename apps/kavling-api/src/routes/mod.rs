//! # HTTP Routes
//!
//! Every route lives under `/api/v1`.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request ──► extractors (State, Admin | Viewer, Path, Query, Json)      │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │          blocking(state, |store| store.<repo>().<op>(..))               │
//! │                 │   runs on the blocking pool: writes fsync             │
//! │                 ▼                                                       │
//! │          {"ok": true, "data": ...}  or  ApiError envelope               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Route Groups
//! - `health`: storage readiness
//! - `hierarchy`: sites, subsites, zones
//! - `bookings`: bookings and availability
//! - `kpr`: KPR applications and their lifecycle
//! - `installments`: plan lookup and generation
//! - `payments`: ledger listing and payment application
//! - `penalties`: late fee preview and charge
//! - `reports`: statement, zone summary, portfolio
//! - `reconcile`: ledger replay on demand

mod bookings;
mod health;
mod hierarchy;
mod installments;
mod kpr;
mod payments;
mod penalties;
mod reconcile;
mod reports;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use kavling_store::{EntityStore, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ok, ApiError, ApiResult};
use crate::AppState;

/// Routes mounted under `/api/v1`.
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Hierarchy
        .route("/sites", get(hierarchy::list_sites).post(hierarchy::create_site))
        .route("/sites/{id}", put(hierarchy::update_site).delete(hierarchy::delete_site))
        .route("/subsites", get(hierarchy::list_subsites).post(hierarchy::create_subsite))
        .route(
            "/subsites/{id}",
            put(hierarchy::update_subsite).delete(hierarchy::delete_subsite),
        )
        .route("/zones", get(hierarchy::list_zones).post(hierarchy::create_zone))
        .route("/zones/{id}", put(hierarchy::update_zone).delete(hierarchy::delete_zone))
        // Bookings
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route("/bookings/{id}", put(bookings::update).delete(bookings::cancel))
        .route("/availability", get(bookings::availability))
        // KPR
        .route("/kpr", get(kpr::get_by_booking).post(kpr::create))
        .route("/kpr/{id}", put(kpr::update))
        .route("/kpr/{id}/submit", post(kpr::submit))
        .route("/kpr/{id}/approve", post(kpr::approve))
        .route("/kpr/{id}/reject", post(kpr::reject))
        .route("/kpr/{id}/cancel", post(kpr::cancel))
        // Installments
        .route("/installments", get(installments::get_by_kpr))
        .route("/installments/{kpr_id}/generate", post(installments::generate))
        // Payments & penalties
        .route("/payments", get(payments::list).post(payments::apply))
        .route("/penalties/preview", get(penalties::preview))
        .route("/penalties/charge", post(penalties::charge))
        // Reports
        .route("/reports/kpr-statement", get(reports::statement))
        .route("/reports/zone-summary", get(reports::zone_summary))
        .route("/reports/portfolio", get(reports::portfolio))
        .route("/reconcile", post(reconcile::run))
}

/// Query parameters shared by the read routes. Each route reads the ones it
/// needs; unknown parameters are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    pub site_id: Option<String>,
    pub subsite_id: Option<String>,
    pub zone_id: Option<String>,
    pub booking_id: Option<String>,
    pub kpr_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub as_of: Option<String>,
}

/// Runs one store operation on the blocking pool and wraps its result.
pub(crate) async fn blocking<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&EntityStore) -> StoreResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || op(&store)).await {
        Ok(result) => Ok(ok(result?)),
        Err(join) => {
            error!(error = %join, "Store task did not complete");
            Err(ApiError::internal("request aborted"))
        }
    }
}
