//! # kavling-core: Domain Engine for Land Booking and KPR Financing
//!
//! Pure validation and transition logic. Every function takes the records
//! it needs plus an explicit `now` / `as_of`, and returns new records; the
//! store decides what to persist.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kavling Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kavling-api (axum)                           │   │
//! │  │    routes ──► admin check ──► spawn_blocking(repository call)   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  kavling-store (repositories)                    │   │
//! │  │    lock ──► snapshot ──► validate ──► write ──► reload           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kavling-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  booking  │  │    kpr    │  │installment│  │  payment  │  │   │
//! │  │   │  overlap  │  │  lifecycle│  │  schedule │  │  ledger   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  penalty  │  │ reconcile │  │  report   │  │   views   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOCKS • NO CLOCK • PURE FUNCTIONS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored records (Site ... Payment)
//! - [`money`] - Whole-rupiah `Money`
//! - [`error`] - Error taxonomy
//! - [`validation`], [`time`] - Input parsing helpers
//! - [`hierarchy`] - Site / subsite / zone CRUD rules
//! - [`booking`] - Booking create/update, overlap, availability
//! - [`kpr`] - KPR creation and state machine
//! - [`installment`] - Flat schedule generation
//! - [`payment`] - DP and installment payment application
//! - [`penalty`] - Late fees and duplicate-charge prevention
//! - [`reconcile`] - Ledger replay
//! - [`report`] - Statements, zone summaries, portfolio totals
//! - [`views`] - Guest-safe projections
//!
//! ## Example Usage
//!
//! ```rust
//! use kavling_core::installment::build_schedule;
//! use kavling_core::Money;
//! use chrono::NaiveDate;
//!
//! let first = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();
//! let lines = build_schedule(Money::from_rupiah(12_000_000), 12, first).unwrap();
//!
//! assert_eq!(lines.len(), 12);
//! assert!(lines.iter().all(|l| l.amount.rupiah() == 1_000_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod booking;
pub mod error;
pub mod hierarchy;
pub mod installment;
pub mod kpr;
pub mod money;
pub mod payment;
pub mod penalty;
pub mod reconcile;
pub mod report;
pub mod time;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

/// Decoded collection items keyed by id, in key order.
pub type Records<T> = std::collections::BTreeMap<String, T>;
