//! # Error Types
//!
//! Domain-specific error types for kavling-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kavling-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kavling-store errors (separate crate)                                 │
//! │  └── StoreError       - Load / persist / lock failures                 │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → ApiError → Client    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error classifies into one [`ErrorKind`]. The kind decides the HTTP
//! status and whether a retry can help; the variant carries the message.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by every error in the workspace.
///
/// | Kind        | Retry?                         |
/// |-------------|--------------------------------|
/// | Validation  | no, fix the input              |
/// | NotFound    | no                             |
/// | Conflict    | no, data-dependent             |
/// | Unavailable | yes, once the store has loaded |
/// | Internal    | no, fatal to the request       |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the booking, KPR, installment, payment and penalty
/// engines.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A caller-supplied id collides with an existing record.
    #[error("id already exists")]
    AlreadyExists { entity: &'static str, id: String },

    /// Another non-cancelled booking in the zone covers part of the range.
    ///
    /// ## When This Occurs
    /// ```text
    /// existing  bk_1: 2025-01-10 ──────── 2025-01-15
    /// new           :        2025-01-14 ──────── 2025-01-20
    ///                        ▲ overlap (inclusive bounds)
    /// ```
    #[error("date range overlaps existing booking")]
    DateOverlap { zone_id: String, booking_id: String },

    /// Requested status change is not in the transition table, or the stored
    /// status no longer matches the expected `from` state.
    #[error("invalid status transition")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// The record is in a state where its fields can no longer be edited.
    #[error("{entity} cannot be updated in status {status}")]
    NotEditable {
        entity: &'static str,
        id: String,
        status: String,
    },

    /// KPR creation requires a confirmed booking.
    #[error("booking not confirmed")]
    BookingNotConfirmed { booking_id: String },

    /// One live KPR per booking.
    #[error("kpr already exists for booking")]
    KprAlreadyExists { booking_id: String, kpr_id: String },

    /// One installment plan per KPR.
    #[error("installment plan already exists")]
    PlanAlreadyExists { kpr_id: String },

    /// Plan generation / payments require an approved KPR.
    #[error("kpr must be {required} (current: {status})")]
    KprNotPayable {
        kpr_id: String,
        status: String,
        required: &'static str,
    },

    /// Down payment or installment line is already settled.
    #[error("{0} already fully paid")]
    AlreadyPaid(&'static str),

    /// Amount exceeds what is still owed.
    #[error("overpayment: exceeds remaining {target} (remaining {remaining})")]
    Overpayment {
        target: &'static str,
        remaining: crate::Money,
    },

    /// Penalty charge requested for an installment that is not past due.
    #[error("not overdue yet")]
    NotOverdue { installment_no: u32 },

    /// Penalty computed as zero.
    #[error("penalty is zero")]
    ZeroPenalty { installment_no: u32 },

    /// Penalty for this `(kpr, installment, month)` is already on the ledger.
    #[error("penalty already charged for this month")]
    PenaltyAlreadyCharged {
        kpr_id: String,
        installment_no: u32,
        bucket: String,
    },

    /// Parent still has children referencing it.
    #[error("cannot delete {entity} with {children}")]
    HasChildren {
        entity: &'static str,
        children: &'static str,
    },

    /// Stored record could not be decoded where the operation needs it.
    #[error("invalid stored {entity}: {id}")]
    InvalidRecord { entity: &'static str, id: String },

    /// Input validation failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Convenience constructor for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidRecord { .. } => ErrorKind::Internal,
            CoreError::AlreadyExists { .. }
            | CoreError::DateOverlap { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::NotEditable { .. }
            | CoreError::BookingNotConfirmed { .. }
            | CoreError::KprAlreadyExists { .. }
            | CoreError::PlanAlreadyExists { .. }
            | CoreError::KprNotPayable { .. }
            | CoreError::AlreadyPaid(_)
            | CoreError::Overpayment { .. }
            | CoreError::NotOverdue { .. }
            | CoreError::ZeroPenalty { .. }
            | CoreError::PenaltyAlreadyCharged { .. }
            | CoreError::HasChildren { .. } => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state is read, so they never depend on stored data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field is missing or empty after trimming.
    #[error("{field} is required")]
    Required { field: String },

    /// Value has an invalid format.
    #[error("invalid {field} (expected {expected})")]
    InvalidFormat { field: String, expected: String },

    /// Value must be positive (> 0).
    #[error("{field} must be > 0")]
    MustBePositive { field: String },

    /// Value must be non-negative (>= 0).
    #[error("{field} must be >= 0")]
    MustBeNonNegative { field: String },

    /// Value is not one of the allowed values.
    #[error("{field} must be one of: {allowed}")]
    NotAllowed { field: String, allowed: String },

    /// Numeric selector outside the valid range.
    #[error("{field} out of range")]
    OutOfRange { field: String },

    /// Two fields are individually valid but inconsistent with each other
    /// or with the records they reference.
    #[error("{field} {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn date(field: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            expected: "YYYY-MM-DD".to_string(),
        }
    }

    pub fn inconsistent(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Inconsistent {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(
            CoreError::AlreadyPaid("dp").to_string(),
            "dp already fully paid"
        );
        assert_eq!(
            CoreError::PenaltyAlreadyCharged {
                kpr_id: "kpr_1".into(),
                installment_no: 1,
                bucket: "2025-04".into(),
            }
            .to_string(),
            "penalty already charged for this month"
        );
        assert_eq!(
            CoreError::Overpayment {
                target: "dp",
                remaining: Money::from_rupiah(10),
            }
            .to_string(),
            "overpayment: exceeds remaining dp (remaining Rp10)"
        );
        assert_eq!(
            ValidationError::required("customer_name").to_string(),
            "customer_name is required"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoreError::not_found("booking", "bk_1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::from(ValidationError::required("x")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::HasChildren {
                entity: "site",
                children: "subsites"
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::InvalidRecord {
                entity: "kpr",
                id: "k".into()
            }
            .kind(),
            ErrorKind::Internal
        );
    }
}
