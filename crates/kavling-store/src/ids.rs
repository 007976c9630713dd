//! Record identifiers.
//!
//! Generated ids look like `bk_20250110T080000.123456789Z_1f3a9c2e`: a
//! prefix, the UTC creation instant, and eight hex digits of a v4 UUID.

use chrono::{DateTime, Utc};
use kavling_core::CoreError;
use uuid::Uuid;

use crate::collection::Collection;
use crate::error::StoreResult;

pub const SITE: &str = "site";
pub const SUBSITE: &str = "subsite";
pub const ZONE: &str = "zone";
pub const BOOKING: &str = "bk";
pub const KPR: &str = "kpr";
pub const PLAN: &str = "plan";
pub const PAYMENT: &str = "pay";
pub const PENALTY: &str = "penalty";

pub fn new_id(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, now.format("%Y%m%dT%H%M%S%.9fZ"), &suffix[..8])
}

/// Honours a caller-supplied id unless it is already taken, otherwise
/// generates one.
pub fn resolve_id(
    requested: Option<String>,
    prefix: &str,
    existing: &Collection,
    entity: &'static str,
    now: DateTime<Utc>,
) -> StoreResult<String> {
    match requested {
        Some(id) if existing.contains(&id) => Err(CoreError::AlreadyExists { entity, id }.into()),
        Some(id) => Ok(id),
        None => Ok(new_id(prefix, now)),
    }
}
