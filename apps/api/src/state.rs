//! # Shared Application State
//!
//! One state object constructed at startup and cloned into every handler
//! via axum's `State` extractor. The database handle and the payment
//! gateway are explicit members, never ambient globals.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use libreria_db::{CartIdentity, Database};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::payment::SimulatedGateway;
use crate::services::cart_service::CartService;
use crate::services::checkout_service::CheckoutService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub payments: SimulatedGateway,
    pub config: ApiConfig,
}

impl AppState {
    /// Creates the application state.
    pub fn new(db: Database, payments: SimulatedGateway, config: ApiConfig) -> Self {
        AppState {
            db,
            payments,
            config,
        }
    }

    /// Returns the cart service.
    pub fn cart_service(&self) -> CartService {
        CartService::new(self.db.clone())
    }

    /// Returns the checkout service.
    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(self.db.clone(), self.payments.clone())
    }
}

// =============================================================================
// Cart Identity Extractor
// =============================================================================

/// Extracts the cart owner from request headers.
///
/// Carts belong either to a registered customer (`X-Customer-Id`) or to an
/// anonymous session whose opaque token the client generated and persists
/// (`X-Session-Token`). Exactly one header must be present.
#[derive(Debug, Clone)]
pub struct Identity(pub CartIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = header_value(parts, "x-customer-id");
        let session = header_value(parts, "x-session-token");

        match (customer, session) {
            (Some(id), None) => Ok(Identity(CartIdentity::Customer(id))),
            (None, Some(token)) => Ok(Identity(CartIdentity::Session(token))),
            (Some(_), Some(_)) => Err(ApiError::validation(
                "Indica X-Customer-Id o X-Session-Token, no ambos",
            )),
            (None, None) => Err(ApiError::validation(
                "Falta la cabecera X-Customer-Id o X-Session-Token",
            )),
        }
    }
}

/// Like [`Identity`], but tolerates anonymous requests: no header at all
/// yields `None` (used by order listing, where an admin sees everything).
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<CartIdentity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = header_value(parts, "x-customer-id");
        let session = header_value(parts, "x-session-token");

        match (customer, session) {
            (Some(id), None) => Ok(MaybeIdentity(Some(CartIdentity::Customer(id)))),
            (None, Some(token)) => Ok(MaybeIdentity(Some(CartIdentity::Session(token)))),
            (Some(_), Some(_)) => Err(ApiError::validation(
                "Indica X-Customer-Id o X-Session-Token, no ambos",
            )),
            (None, None) => Ok(MaybeIdentity(None)),
        }
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
