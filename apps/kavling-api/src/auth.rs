//! Admin token checks.
//!
//! There are no user accounts: a request is admin when its `X-Admin-Token`
//! header equals the configured `ADMIN_TOKEN`.
//!
//! - [`Admin`] rejects anything else with 401 (write routes, private reads).
//! - [`Viewer`] never rejects; it only decides whether a public read is
//!   redacted.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

pub const ADMIN_HEADER: &str = "x-admin-token";

/// Outcome of comparing a request's token with the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Admin,
    NotConfigured,
    Rejected,
}

pub fn check_token(headers: &HeaderMap, configured: &str) -> TokenCheck {
    if configured.is_empty() {
        return TokenCheck::NotConfigured;
    }
    let presented = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if presented == configured {
        TokenCheck::Admin
    } else {
        TokenCheck::Rejected
    }
}

/// Extractor that only lets admin requests through.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match check_token(&parts.headers, &state.admin_token) {
            TokenCheck::Admin => Ok(Admin),
            TokenCheck::NotConfigured => Err(ApiError::unauthorized("admin token not configured")),
            TokenCheck::Rejected => {
                warn!(path = %parts.uri.path(), "Admin token rejected");
                Err(ApiError::unauthorized("unauthorized"))
            }
        }
    }
}

/// Extractor for public reads: admin callers see unredacted records.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Viewer {
            is_admin: check_token(&parts.headers, &state.admin_token) == TokenCheck::Admin,
        })
    }
}
