//! # Error Types
//!
//! Domain-specific error types for libreria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libreria-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  libreria-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  API errors (in app)                                                    │
//! │  └── ApiError         - What the client sees (HTTP status + JSON)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (book id, available stock, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message in the API layer

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The API layer translates them to HTTP statuses and user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity is zero or negative.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Book cannot be purchased: it does not exist or is inactive
    /// (soft-deleted).
    #[error("Book not available: {0}")]
    BookUnavailable(String),

    /// Requested quantity exceeds the book's current stock.
    ///
    /// Raised by the stock gate on every cart mutation and again by the
    /// guarded decrement at order confirmation. `available` is the stock
    /// level observed at check time, `requested` the merged line quantity.
    #[error("Insufficient stock for '{title}': available {available}, requested {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// The (cart, book) line does not exist.
    #[error("Book {0} is not in the cart")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Operation requires a non-empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Coupon exists but cannot be applied (inactive, out of range).
    #[error("Coupon '{code}' cannot be applied: {reason}")]
    CouponNotRedeemable { code: String, reason: String },

    /// The checkout session is not in a state that allows the requested
    /// transition. Guards the strictly forward/backward wizard order.
    #[error("Checkout session is {state}, cannot {action}")]
    InvalidCheckoutState { state: String, action: String },

    /// Order status change violates the lifecycle.
    #[error("Order is {current}, cannot change to {requested}")]
    InvalidOrderTransition { current: String, requested: String },

    /// The payment gateway declined the charge. The checkout session stays
    /// in the payment step for retry.
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
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

    /// Invalid format (e.g. invalid UUID, malformed ISBN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. duplicate ISBN or coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
        let err = CoreError::InsufficientStock {
            title: "El Quijote".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'El Quijote': available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "isbn".to_string(),
        };
        assert_eq!(err.to_string(), "isbn is required");

        let err = ValidationError::OutOfRange {
            field: "discountPct".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "discountPct must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
