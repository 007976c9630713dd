//! # Kavling API
//!
//! HTTP surface for the kavling booking and KPR backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kavling API Server                               │
//! │                                                                         │
//! │  client ───► axum (:16000) ───► routes ───► kavling-store ───► JSON     │
//! │                 │                              │               files    │
//! │                 │                              ▼                        │
//! │                 │                        kavling-core rules             │
//! │                 ▼                                                       │
//! │          X-Admin-Token                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` only wires configuration, tracing and shutdown;
//! everything a request touches is built here so tests can drive the
//! router without a socket.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use kavling_store::EntityStore;

use crate::error::{ApiError, ErrorCode};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    /// Empty when no admin token is configured.
    pub admin_token: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<EntityStore>, admin_token: &str) -> Self {
        AppState {
            store,
            admin_token: Arc::from(admin_token.trim()),
        }
    }
}

/// Builds the full router: `/api/v1/*` plus an enveloped 404 fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api())
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, "route not found")
}
