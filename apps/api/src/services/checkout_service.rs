//! # Checkout Service
//!
//! Drives the durable checkout wizard: session creation, shipping
//! submission, coupon application, payment, and the confirmation
//! transaction.
//!
//! ## Wizard Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /checkout            → start()           Draft                    │
//! │  PUT  /checkout/:id/envio  → submit_shipping() Draft → PaymentPending   │
//! │  POST /checkout/:id/atras  → back()            PaymentPending → Draft   │
//! │  POST /checkout/:id/cupon  → apply_coupon()    Draft | PaymentPending   │
//! │  POST /checkout/:id/pago   → pay()             PaymentPending →         │
//! │                                                Confirmed (or stays on   │
//! │                                                decline/stock conflict)  │
//! │  POST /checkout/:id/cancelar → cancel()        → Failed                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is a database row; every transition re-reads it and checks
//! the state guard before touching anything, so stale clients get a clean
//! conflict instead of corrupting the wizard.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use libreria_core::cart::Cart;
use libreria_core::{
    CheckoutAction, CheckoutState, CoreError, Money, PaymentMethod, ShippingInfo,
};
use libreria_db::{
    CartIdentity, CheckoutConfirmation, CheckoutSession, ConfirmCheckoutParams, Database,
};

use crate::error::ApiError;
use crate::payment::{PaymentOutcome, SimulatedGateway};

// =============================================================================
// Response Types
// =============================================================================

/// Checkout session response: state plus a priced preview of the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub session_id: String,
    pub state: CheckoutState,
    pub shipping: Option<ShippingInfo>,
    pub payment_method: Option<PaymentMethod>,
    pub coupon_code: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub order_id: Option<String>,
    pub last_error: Option<String>,
}

/// Totals of the session's cart with the coupon discount applied.
#[derive(Debug, Clone, Copy)]
struct CheckoutTotals {
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
}

fn totals_for(cart: &Cart, coupon_discount_pct: Option<i64>) -> CheckoutTotals {
    let subtotal = Money::from_cents(cart.total_cents());
    let discount = coupon_discount_pct
        .map(|pct| subtotal.percentage_of(pct))
        .unwrap_or_else(Money::zero);

    CheckoutTotals {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount.cents(),
        total_cents: (subtotal - discount).cents(),
    }
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Service for checkout operations.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    payments: SimulatedGateway,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database, payments: SimulatedGateway) -> Self {
        CheckoutService { db, payments }
    }

    /// Starts a checkout session for the identity's cart.
    ///
    /// Requires a non-empty cart.
    pub async fn start(&self, identity: &CartIdentity) -> Result<CheckoutView, ApiError> {
        let cart_row = self.db.carts().get_or_create(identity).await?;
        let cart = Cart::from_lines(self.db.carts().lines(&cart_row.id).await?);

        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let session = self.db.checkout_sessions().create(&cart_row.id).await?;
        info!(session_id = %session.id, cart_id = %cart_row.id, "Checkout started");

        self.view_of(session).await
    }

    /// Returns the current session state and priced preview.
    pub async fn get(&self, session_id: &str) -> Result<CheckoutView, ApiError> {
        let session = self.fetch(session_id).await?;
        self.view_of(session).await
    }

    /// First wizard step: validates and stores the shipping form.
    ///
    /// Violations come back as field-keyed errors and the session does not
    /// advance.
    pub async fn submit_shipping(
        &self,
        session_id: &str,
        shipping: &ShippingInfo,
    ) -> Result<CheckoutView, ApiError> {
        debug!(session_id = %session_id, "Submitting shipping form");

        let session = self.fetch(session_id).await?;
        session
            .state
            .ensure(CheckoutAction::SubmitShipping)
            .map_err(ApiError::from)?;

        if let Err(errors) = shipping.validate() {
            return Err(ApiError::validation_fields(
                "Datos de envío incompletos",
                errors,
            ));
        }

        self.db
            .checkout_sessions()
            .submit_shipping(session_id, shipping)
            .await?;

        let session = self.fetch(session_id).await?;
        self.view_of(session).await
    }

    /// Steps back from payment selection to the shipping form.
    pub async fn back(&self, session_id: &str) -> Result<CheckoutView, ApiError> {
        let session = self.fetch(session_id).await?;
        session
            .state
            .ensure(CheckoutAction::GoBack)
            .map_err(ApiError::from)?;

        self.db.checkout_sessions().back_to_draft(session_id).await?;

        let session = self.fetch(session_id).await?;
        self.view_of(session).await
    }

    /// Applies a coupon code to the session.
    pub async fn apply_coupon(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutView, ApiError> {
        debug!(session_id = %session_id, code = %code, "Applying coupon");

        let session = self.fetch(session_id).await?;
        session
            .state
            .ensure(CheckoutAction::ApplyCoupon)
            .map_err(ApiError::from)?;

        let coupon = self
            .db
            .coupons()
            .get_by_code(code)
            .await?
            .ok_or_else(|| ApiError::not_found("Cupón", code))?;

        if !coupon.is_redeemable() {
            return Err(CoreError::CouponNotRedeemable {
                code: coupon.code,
                reason: "no está activo".to_string(),
            }
            .into());
        }

        self.db
            .checkout_sessions()
            .set_coupon(session_id, &coupon.code, coupon.discount_pct)
            .await?;

        let session = self.fetch(session_id).await?;
        self.view_of(session).await
    }

    /// Second wizard step: attempts payment and, on approval, runs the
    /// confirmation transaction (order + guarded stock decrement + cart
    /// clear).
    ///
    /// A declined charge records the error and leaves the session in
    /// PaymentPending for retry; a stock conflict aborts the whole
    /// confirmation with nothing written.
    pub async fn pay(
        &self,
        session_id: &str,
        method: PaymentMethod,
    ) -> Result<CheckoutView, ApiError> {
        debug!(session_id = %session_id, ?method, "Payment attempt");

        let session = self.fetch(session_id).await?;
        session
            .state
            .ensure(CheckoutAction::Pay)
            .map_err(ApiError::from)?;

        let shipping = session.shipping().ok_or_else(|| {
            ApiError::internal("checkout session in payment step without shipping data")
        })?;

        let cart = Cart::from_lines(self.db.carts().lines(&session.cart_id).await?);
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let totals = totals_for(&cart, session.coupon_discount_pct);

        let outcome = self
            .payments
            .charge(Money::from_cents(totals.total_cents), method)
            .await;

        let reference = match outcome {
            PaymentOutcome::Declined { reason } => {
                self.db
                    .checkout_sessions()
                    .record_payment_failure(session_id, method, &reason)
                    .await?;
                info!(session_id = %session_id, "Payment declined");
                return Err(CoreError::PaymentDeclined(reason).into());
            }
            PaymentOutcome::Approved { reference } => reference,
        };

        debug!(session_id = %session_id, reference = %reference, "Payment approved");

        let cart_row = self
            .db
            .carts()
            .get_by_id(&session.cart_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Carrito", &session.cart_id))?;
        let owner = match (cart_row.customer_id, cart_row.session_token) {
            (Some(id), _) => CartIdentity::Customer(id),
            (None, Some(token)) => CartIdentity::Session(token),
            (None, None) => return Err(ApiError::internal("cart without owner")),
        };

        let confirmation = self
            .db
            .orders()
            .confirm_checkout(ConfirmCheckoutParams {
                session: &session,
                owner: &owner,
                shipping: &shipping,
                payment_method: method,
                lines: &cart.lines,
                subtotal_cents: totals.subtotal_cents,
                discount_cents: totals.discount_cents,
                total_cents: totals.total_cents,
                coupon_code: session.coupon_code.clone(),
            })
            .await?;

        match confirmation {
            CheckoutConfirmation::StockConflict {
                title,
                available,
                requested,
                ..
            } => Err(CoreError::InsufficientStock {
                title,
                available,
                requested,
            }
            .into()),
            CheckoutConfirmation::Confirmed(order) => {
                info!(session_id = %session_id, order_id = %order.id, "Checkout confirmed");
                let session = self.fetch(session_id).await?;
                self.view_of(session).await
            }
        }
    }

    /// Cancels an open session.
    pub async fn cancel(&self, session_id: &str) -> Result<CheckoutView, ApiError> {
        let session = self.fetch(session_id).await?;
        session
            .state
            .ensure(CheckoutAction::Cancel)
            .map_err(ApiError::from)?;

        self.db.checkout_sessions().mark_failed(session_id).await?;
        info!(session_id = %session_id, "Checkout cancelled");

        let session = self.fetch(session_id).await?;
        self.view_of(session).await
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn fetch(&self, session_id: &str) -> Result<CheckoutSession, ApiError> {
        self.db
            .checkout_sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Sesión de checkout", session_id))
    }

    /// Builds the response view. For open sessions the totals are a live
    /// preview of the cart; confirmed sessions report the frozen order
    /// totals instead.
    async fn view_of(&self, session: CheckoutSession) -> Result<CheckoutView, ApiError> {
        let totals = match (&session.state, &session.order_id) {
            (CheckoutState::Confirmed, Some(order_id)) => {
                let order = self
                    .db
                    .orders()
                    .get_by_id(order_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Pedido", order_id))?;
                CheckoutTotals {
                    subtotal_cents: order.subtotal_cents,
                    discount_cents: order.discount_cents,
                    total_cents: order.total_cents,
                }
            }
            _ => {
                let cart = Cart::from_lines(self.db.carts().lines(&session.cart_id).await?);
                totals_for(&cart, session.coupon_discount_pct)
            }
        };

        let shipping = session.shipping();
        Ok(CheckoutView {
            session_id: session.id,
            state: session.state,
            shipping,
            payment_method: session.payment_method,
            coupon_code: session.coupon_code,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            total_cents: totals.total_cents,
            order_id: session.order_id,
            last_error: session.last_error,
        })
    }
}
