//! # Validation Module
//!
//! Input validation shared by every engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (axum extractors)                                       │
//! │  └── JSON shape / types                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── trimming, required fields                                         │
//! │  └── dates, amounts, ranges                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engines (booking, kpr, payment, ...)                         │
//! │  └── rules that need stored state (overlap, transitions, balances)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trims `value` and rejects it if nothing is left.
///
/// ```rust
/// use kavling_core::validation::required;
///
/// assert_eq!(required("name", "  Blok A ").unwrap(), "Blok A");
/// assert!(required("name", "   ").is_err());
/// ```
pub fn required(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional input, mapping blank to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn positive(field: &str, amount: Money) -> ValidationResult<Money> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

pub fn non_negative(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Inclusive date range check: `end >= start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::inconsistent(
            "end_date",
            "must be >= start_date",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" x ")), Some("x".to_string()));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_amount_rules() {
        assert!(positive("amount", Money::zero()).is_err());
        assert!(positive("amount", Money::from_rupiah(1)).is_ok());
        assert!(non_negative("dp_amount", Money::zero()).is_ok());
        assert_eq!(
            non_negative("dp_amount", Money::from_rupiah(-1))
                .unwrap_err()
                .to_string(),
            "dp_amount must be >= 0"
        );
    }

    #[test]
    fn test_date_range() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert!(date_range(a, b).is_ok());
        assert!(date_range(a, a).is_ok());
        assert_eq!(
            date_range(b, a).unwrap_err().to_string(),
            "end_date must be >= start_date"
        );
    }
}
