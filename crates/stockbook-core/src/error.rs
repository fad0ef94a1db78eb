//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Stock / balance rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  billing app errors                                                    │
//! │  └── BillingError     - What the caller of place_order / settle sees   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError                       │
//! │                          DbError   ─┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation and balance errors are raised before any store call, so they
//! never describe a half-written state.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Requested quantity exceeds what the ledger can supply.
    ///
    /// ## When This Occurs
    /// - A draft line asks for more than `available_quantity`
    /// - The summed remainders of the FIFO lots are short of the request
    /// - A manual removal exceeds the available quantity
    #[error("Insufficient stock for {product} ({size}): available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        size: String,
        available: i64,
        requested: i64,
    },

    /// A payment split does not exactly match the amount it must cover.
    ///
    /// ## When This Occurs
    /// - Order placement: `upi + cash + pay_later != grand_total`
    /// - Settlement: `upi + cash != Σ selected remaining balances`
    #[error("Payment of {actual} does not match amount due {expected}")]
    BalanceMismatch { expected: Money, actual: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InsufficientStock error.
    pub fn insufficient(
        product: impl Into<String>,
        size: impl Into<String>,
        available: i64,
        requested: i64,
    ) -> Self {
        CoreError::InsufficientStock {
            product: product.into(),
            size: size.into(),
            available,
            requested,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while checking customer and line-item input, before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The same order was selected twice for one settlement.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::Negative {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::insufficient("Linen Shirt", "M", 3, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Linen Shirt (M): available 3, requested 5"
        );

        let err = CoreError::BalanceMismatch {
            expected: Money::from_cents(164_000),
            actual: Money::from_cents(160_000),
        };
        assert_eq!(
            err.to_string(),
            "Payment of ₹1600.00 does not match amount due ₹1640.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("customer name").to_string(),
            "customer name is required"
        );
        assert_eq!(
            ValidationError::negative("cash amount").to_string(),
            "cash amount must not be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
