//! # Checkout Routes
//!
//! `/checkout` - the three-step purchase wizard backed by a durable
//! server-side session.
//!
//! | Method | Path                    | Description                          |
//! |--------|-------------------------|--------------------------------------|
//! | POST   | /checkout               | Start a session from the cart        |
//! | GET    | /checkout/:id           | Session state + priced preview       |
//! | PUT    | /checkout/:id/envio     | Submit the shipping form             |
//! | POST   | /checkout/:id/atras     | Back to the shipping step            |
//! | POST   | /checkout/:id/cupon     | Apply a coupon code                  |
//! | POST   | /checkout/:id/pago      | Select method and attempt payment    |
//! | POST   | /checkout/:id/cancelar  | Cancel the session                   |

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use libreria_core::{PaymentMethod, ShippingInfo};

use crate::error::ApiError;
use crate::services::checkout_service::CheckoutView;
use crate::state::{AppState, Identity};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start))
        .route("/{id}", get(detail))
        .route("/{id}/envio", put(submit_shipping))
        .route("/{id}/atras", post(back))
        .route("/{id}/cupon", post(apply_coupon))
        .route("/{id}/pago", post(pay))
        .route("/{id}/cancelar", post(cancel))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyCouponRequest {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayRequest {
    /// One of the closed set: card, wallet, bank_transfer.
    method: PaymentMethod,
}

/// Starts a checkout session for the caller's cart.
async fn start(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<(StatusCode, Json<CheckoutView>), ApiError> {
    debug!("POST /checkout");

    let view = state.checkout_service().start(&identity).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the session state and a priced preview of its cart.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutView>, ApiError> {
    Ok(Json(state.checkout_service().get(&id).await?))
}

/// Submits the shipping form (first wizard step).
///
/// Empty or malformed fields come back as `fieldErrors` keyed by field
/// name and the session stays in the shipping step.
async fn submit_shipping(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(shipping): Json<ShippingInfo>,
) -> Result<Json<CheckoutView>, ApiError> {
    debug!(session_id = %id, "PUT /checkout/:id/envio");

    let view = state
        .checkout_service()
        .submit_shipping(&id, &shipping)
        .await?;
    Ok(Json(view))
}

/// Returns to the shipping step from payment selection.
async fn back(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutView>, ApiError> {
    debug!(session_id = %id, "POST /checkout/:id/atras");
    Ok(Json(state.checkout_service().back(&id).await?))
}

/// Applies a coupon code to the session.
async fn apply_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<CheckoutView>, ApiError> {
    debug!(session_id = %id, "POST /checkout/:id/cupon");

    let view = state
        .checkout_service()
        .apply_coupon(&id, &req.code)
        .await?;
    Ok(Json(view))
}

/// Selects a payment method and attempts the charge.
///
/// On approval the order is created, stock is decremented, and the cart is
/// cleared, all in one transaction. A decline leaves the session in the
/// payment step for retry.
async fn pay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PayRequest>,
) -> Result<Json<CheckoutView>, ApiError> {
    debug!(session_id = %id, "POST /checkout/:id/pago");

    let view = state.checkout_service().pay(&id, req.method).await?;
    Ok(Json(view))
}

/// Cancels the session.
async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutView>, ApiError> {
    debug!(session_id = %id, "POST /checkout/:id/cancelar");
    Ok(Json(state.checkout_service().cancel(&id).await?))
}
