//! # API Error Type
//!
//! Unified error type for REST handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database Error? ─── DbError::NotFound ──────┐                          │
//! │         │                                    │                          │
//! │         ▼                                    ▼                          │
//! │  Business Error? ─── CoreError::... ───── ApiError ──► HTTP status +    │
//! │         │                                             JSON body         │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────► 200/201/204        │
//! │                                                                         │
//! │  Body: { "code": "INSUFFICIENT_STOCK",                                  │
//! │          "message": "Stock insuficiente. Solo quedan 5 unidades",       │
//! │          "fieldErrors": { "email": "obligatorio" } }  (optional)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages shown to shoppers (cart, checkout, payment) are in the
//! storefront's language; internal detail stays in the logs, never in the
//! 500 body.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use libreria_core::{CoreError, FieldErrors};
use libreria_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Libro no disponible: abc-123"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field validation errors, keyed by wire field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Business rule violation: duplicates, coupon rules (409)
    BusinessRule,

    /// Requested quantity exceeds stock (409)
    InsufficientStock,

    /// Checkout wizard step out of order (409)
    InvalidState,

    /// Payment declined by the gateway (402)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::BusinessRule => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::InvalidState => StatusCode::CONFLICT,
            ErrorCode::PaymentError => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} no encontrado: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a validation error carrying per-field messages.
    pub fn validation_fields(message: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError {
            code: ErrorCode::ValidationError,
            message: message.into(),
            field_errors: Some(errors.0),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value: _ } => ApiError::new(
                ErrorCode::BusinessRule,
                format!("Ya existe un recurso con el mismo valor de {}", field),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Referencia no válida")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidQuantity(_) => {
                ApiError::validation("La cantidad debe ser mayor que cero")
            }
            CoreError::BookUnavailable(id) => ApiError::not_found("Libro", &id),
            CoreError::InsufficientStock { available, .. } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("Stock insuficiente. Solo quedan {} unidades", available),
            ),
            CoreError::LineNotFound(_) => ApiError::new(
                ErrorCode::NotFound,
                "El libro no está en el carrito".to_string(),
            ),
            CoreError::CartTooLarge { max } => ApiError::validation(format!(
                "El carrito no puede tener más de {} artículos",
                max
            )),
            CoreError::QuantityTooLarge { max, .. } => {
                ApiError::validation(format!("La cantidad máxima por artículo es {}", max))
            }
            CoreError::EmptyCart => ApiError::validation("El carrito está vacío"),
            CoreError::CouponNotRedeemable { code, reason } => ApiError::new(
                ErrorCode::BusinessRule,
                format!("El cupón '{}' no se puede aplicar: {}", code, reason),
            ),
            CoreError::InvalidCheckoutState { state, action } => ApiError::new(
                ErrorCode::InvalidState,
                format!("Checkout session is {}, cannot {}", state, action),
            ),
            CoreError::InvalidOrderTransition { current, requested } => ApiError::new(
                ErrorCode::InvalidState,
                format!("Order is {}, cannot change to {}", current, requested),
            ),
            CoreError::PaymentDeclined(reason) => {
                ApiError::new(ErrorCode::PaymentError, format!("Pago rechazado: {}", reason))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err: ApiError = CoreError::InsufficientStock {
            title: "La Regenta".to_string(),
            available: 5,
            requested: 6,
        }
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Stock insuficiente. Solo quedan 5 unidades");
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::PaymentError.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(ErrorCode::InvalidState.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_db_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("Libro", "abc").into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_field_errors_serialized_only_when_present() {
        let err = ApiError::validation("mal");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("fieldErrors").is_none());
    }
}
