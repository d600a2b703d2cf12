//! # Validation Module
//!
//! Input validation utilities for catalog and coupon payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request DTOs (serde)                                          │
//! │  └── Type/shape validation at deserialization                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Business rule validation before any persistence call               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / UNIQUE / FK constraints                                 │
//! │  └── CHECK constraints (stock >= 0, one cart owner)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an ISBN.
///
/// ## Rules
/// - Must not be empty
/// - At most 17 characters (ISBN-13 with hyphens)
/// - Digits, hyphens, and a trailing X (ISBN-10 check digit) only
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    let isbn = isbn.trim();

    if isbn.is_empty() {
        return Err(ValidationError::Required {
            field: "isbn".to_string(),
        });
    }

    if isbn.len() > 17 {
        return Err(ValidationError::TooLong {
            field: "isbn".to_string(),
            max: 17,
        });
    }

    if !isbn
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == 'X' || c == 'x')
    {
        return Err(ValidationError::InvalidFormat {
            field: "isbn".to_string(),
            reason: "must contain only digits, hyphens, and X".to_string(),
        });
    }

    Ok(())
}

/// Validates a book title.
///
/// ## Rules
/// - Must not be empty
/// - At most 300 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 300 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 300,
        });
    }

    Ok(())
}

/// Validates a taxonomy name (category, author, publisher).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty, at most 30 characters
/// - Letters, digits, hyphens, underscores only
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 30,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0); zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "priceCents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount percentage (coupons and sale flags).
///
/// ## Rules
/// - Must be between 0 and 100 inclusive
pub fn validate_discount_pct(pct: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discountPct".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("9788437604947").is_ok());
        assert!(validate_isbn("978-84-376-0494-7").is_ok());
        assert!(validate_isbn("84376049X").is_ok());

        assert!(validate_isbn("").is_err());
        assert!(validate_isbn("   ").is_err());
        assert!(validate_isbn("not an isbn").is_err());
        assert!(validate_isbn("978-84-376-0494-7-0000").is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Cien años de soledad").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"A".repeat(400)).is_err());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("VERANO10").is_ok());
        assert!(validate_coupon_code("black-friday_24").is_ok());

        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("has space").is_err());
        assert!(validate_coupon_code(&"A".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(42).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_discount_pct() {
        assert!(validate_discount_pct(0).is_ok());
        assert!(validate_discount_pct(50).is_ok());
        assert!(validate_discount_pct(100).is_ok());

        assert!(validate_discount_pct(-1).is_err());
        assert!(validate_discount_pct(101).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
