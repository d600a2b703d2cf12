//! End-to-end checkout scenarios against an in-memory database.
//!
//! These drive the service layer exactly as the handlers do: cart
//! mutations through the pricing engine and stock gate, then the full
//! wizard (shipping → payment → confirmation), including the decline-retry
//! path and the guarded stock decrement under contention.

use chrono::Utc;
use uuid::Uuid;

use libreria_api::error::ErrorCode;
use libreria_api::payment::SimulatedGateway;
use libreria_api::services::cart_service::CartService;
use libreria_api::services::checkout_service::CheckoutService;
use libreria_core::{Book, CheckoutState, OrderStatus, PaymentMethod, ShippingInfo};
use libreria_db::{CartIdentity, Database, DbConfig};

// =============================================================================
// Helpers
// =============================================================================

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_book(db: &Database, title: &str, price_cents: i64, stock: i64) -> Book {
    let now = Utc::now();
    let book = Book {
        id: Uuid::new_v4().to_string(),
        isbn: format!("978{}", &Uuid::new_v4().simple().to_string()[..10]),
        title: title.to_string(),
        description: None,
        price_cents,
        stock,
        category_id: None,
        publisher_id: None,
        is_active: true,
        on_sale: false,
        sale_discount_pct: None,
        created_at: now,
        updated_at: now,
    };
    db.books().insert(&book).await.unwrap();
    book
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        name: "Ana".to_string(),
        surname: "García".to_string(),
        street: "Calle Mayor 12".to_string(),
        city: "Madrid".to_string(),
        postal_code: "28013".to_string(),
        phone: "+34 600 000 000".to_string(),
        email: "ana@example.com".to_string(),
    }
}

fn session_identity(token: &str) -> CartIdentity {
    CartIdentity::Session(token.to_string())
}

// =============================================================================
// Cart Scenarios
// =============================================================================

#[tokio::test]
async fn add_over_stock_reports_spanish_message_and_leaves_cart_unchanged() {
    let db = test_db().await;
    let book = seed_book(&db, "La Regenta", 1000, 5).await;
    let carts = CartService::new(db.clone());
    let identity = session_identity("tok-1");

    // stock=5: add 3 → ok
    let view = carts.add_item(&identity, &book.id, 3).await.unwrap();
    assert_eq!(view.totals.total_quantity, 3);

    // add 3 more → rejected, the merged quantity (6) exceeds stock
    let err = carts.add_item(&identity, &book.id, 3).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(err.message, "Stock insuficiente. Solo quedan 5 unidades");

    // line quantity unchanged
    let view = carts.view(&identity).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 3);
    assert_eq!(view.totals.total_cents, 3000);
}

#[tokio::test]
async fn update_to_zero_removes_line_and_clear_keeps_cart() {
    let db = test_db().await;
    let a = seed_book(&db, "Libro A", 10000, 10).await;
    let b = seed_book(&db, "Libro B", 5000, 10).await;
    let carts = CartService::new(db.clone());
    let identity = session_identity("tok-2");

    carts.add_item(&identity, &a.id, 2).await.unwrap();
    carts.add_item(&identity, &b.id, 1).await.unwrap();

    let view = carts.view(&identity).await.unwrap();
    assert_eq!(view.totals.total_cents, 25000);

    let view = carts.update_quantity(&identity, &a.id, 0).await.unwrap();
    assert_eq!(view.totals.total_cents, 5000);
    assert_eq!(view.totals.line_count, 1);

    let cart_id = view.cart_id.clone();
    let view = carts.clear(&identity).await.unwrap();
    assert_eq!(view.totals.total_cents, 0);
    assert_eq!(view.totals.total_quantity, 0);
    assert_eq!(view.totals.line_count, 0);
    // Same cart entity is reused after clearing
    assert_eq!(view.cart_id, cart_id);
}

#[tokio::test]
async fn merge_reprices_line_at_current_price() {
    let db = test_db().await;
    let mut book = seed_book(&db, "Rayuela", 1000, 10).await;
    let carts = CartService::new(db.clone());
    let identity = session_identity("tok-3");

    carts.add_item(&identity, &book.id, 1).await.unwrap();

    // Price changes in the catalog between the two adds
    book.price_cents = 1200;
    db.books().update(&book).await.unwrap();

    let view = carts.add_item(&identity, &book.id, 1).await.unwrap();
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].unit_price_cents, 1200);
    assert_eq!(view.totals.total_cents, 2400);
}

// =============================================================================
// Checkout Scenarios
// =============================================================================

#[tokio::test]
async fn full_wizard_confirms_order_decrements_stock_and_clears_cart() {
    let db = test_db().await;
    let book = seed_book(&db, "Ficciones", 2000, 5).await;
    db.coupons().insert("VERANO10", 10, true).await.unwrap();

    let carts = CartService::new(db.clone());
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let identity = session_identity("tok-4");

    carts.add_item(&identity, &book.id, 3).await.unwrap();

    let view = checkout.start(&identity).await.unwrap();
    assert_eq!(view.state, CheckoutState::Draft);
    assert_eq!(view.subtotal_cents, 6000);

    let view = checkout
        .submit_shipping(&view.session_id, &shipping())
        .await
        .unwrap();
    assert_eq!(view.state, CheckoutState::PaymentPending);

    let view = checkout
        .apply_coupon(&view.session_id, "VERANO10")
        .await
        .unwrap();
    assert_eq!(view.discount_cents, 600);
    assert_eq!(view.total_cents, 5400);

    let view = checkout
        .pay(&view.session_id, PaymentMethod::Card)
        .await
        .unwrap();
    assert_eq!(view.state, CheckoutState::Confirmed);
    let order_id = view.order_id.clone().unwrap();

    // Order persisted with frozen totals and pending status
    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal_cents, 6000);
    assert_eq!(order.discount_cents, 600);
    assert_eq!(order.total_cents, 5400);
    assert_eq!(order.coupon_code.as_deref(), Some("VERANO10"));
    assert_eq!(order.ship_email, "ana@example.com");

    let items = db.orders().items(&order_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].subtotal_cents, 6000);

    // Stock decremented exactly once
    let book = db.books().get_by_id(&book.id).await.unwrap().unwrap();
    assert_eq!(book.stock, 2);

    // Cart items cleared, cart entity reused
    let view = carts.view(&identity).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn incomplete_shipping_reports_field_error_and_stays_in_draft() {
    let db = test_db().await;
    let book = seed_book(&db, "Platero y yo", 895, 10).await;

    let carts = CartService::new(db.clone());
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let identity = session_identity("tok-5");

    carts.add_item(&identity, &book.id, 1).await.unwrap();
    let view = checkout.start(&identity).await.unwrap();

    let mut form = shipping();
    form.email = String::new();

    let err = checkout
        .submit_shipping(&view.session_id, &form)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    let fields = err.field_errors.unwrap();
    assert!(fields.contains_key("email"));

    // Did not advance to the payment step
    let view = checkout.get(&view.session_id).await.unwrap();
    assert_eq!(view.state, CheckoutState::Draft);
}

#[tokio::test]
async fn wizard_rejects_skipping_and_supports_going_back() {
    let db = test_db().await;
    let book = seed_book(&db, "Romancero gitano", 1095, 10).await;

    let carts = CartService::new(db.clone());
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let identity = session_identity("tok-6");

    carts.add_item(&identity, &book.id, 1).await.unwrap();
    let view = checkout.start(&identity).await.unwrap();

    // Paying from the shipping step is out of order
    let err = checkout
        .pay(&view.session_id, PaymentMethod::Wallet)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    checkout
        .submit_shipping(&view.session_id, &shipping())
        .await
        .unwrap();

    // Strictly backward is allowed
    let back = checkout.back(&view.session_id).await.unwrap();
    assert_eq!(back.state, CheckoutState::Draft);
    // The submitted form is kept for prefill
    assert!(back.shipping.is_some());
}

#[tokio::test]
async fn declined_payment_keeps_session_open_for_retry() {
    let db = test_db().await;
    let book = seed_book(&db, "La casa de los espíritus", 1675, 10).await;

    let carts = CartService::new(db.clone());
    let declining = CheckoutService::new(db.clone(), SimulatedGateway::declining());
    let approving = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let identity = session_identity("tok-7");

    carts.add_item(&identity, &book.id, 2).await.unwrap();
    let view = declining.start(&identity).await.unwrap();
    declining
        .submit_shipping(&view.session_id, &shipping())
        .await
        .unwrap();

    let err = declining
        .pay(&view.session_id, PaymentMethod::BankTransfer)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentError);

    // Still in the payment step, decline recorded, cart untouched
    let view = declining.get(&view.session_id).await.unwrap();
    assert_eq!(view.state, CheckoutState::PaymentPending);
    assert!(view.last_error.is_some());
    assert_eq!(carts.view(&identity).await.unwrap().items.len(), 1);

    // No stock was consumed by the failed attempt
    assert_eq!(
        db.books().get_by_id(&book.id).await.unwrap().unwrap().stock,
        10
    );

    // Retry against a working gateway succeeds
    let confirmed = approving
        .pay(&view.session_id, PaymentMethod::BankTransfer)
        .await
        .unwrap();
    assert_eq!(confirmed.state, CheckoutState::Confirmed);
    assert!(confirmed.last_error.is_none());
}

#[tokio::test]
async fn stock_conflict_at_confirmation_aborts_with_no_partial_writes() {
    let db = test_db().await;
    let book = seed_book(&db, "Cien años de soledad", 1995, 5).await;

    let carts = CartService::new(db.clone());
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let first = session_identity("tok-8a");
    let second = session_identity("tok-8b");

    // Both carts pass the advisory stock gate (3 <= 5 each)
    carts.add_item(&first, &book.id, 3).await.unwrap();
    carts.add_item(&second, &book.id, 3).await.unwrap();

    let s1 = checkout.start(&first).await.unwrap();
    checkout.submit_shipping(&s1.session_id, &shipping()).await.unwrap();
    let s2 = checkout.start(&second).await.unwrap();
    checkout.submit_shipping(&s2.session_id, &shipping()).await.unwrap();

    // First confirmation wins the stock
    checkout.pay(&s1.session_id, PaymentMethod::Card).await.unwrap();
    assert_eq!(
        db.books().get_by_id(&book.id).await.unwrap().unwrap().stock,
        2
    );

    // Second hits the guarded decrement and aborts whole
    let err = checkout
        .pay(&s2.session_id, PaymentMethod::Card)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(err.message, "Stock insuficiente. Solo quedan 2 unidades");

    // No partial writes: one order, stock still 2, loser's cart and
    // session intact
    assert_eq!(db.orders().count(None).await.unwrap(), 1);
    assert_eq!(
        db.books().get_by_id(&book.id).await.unwrap().unwrap().stock,
        2
    );
    assert_eq!(carts.view(&second).await.unwrap().items.len(), 1);
    let view = checkout.get(&s2.session_id).await.unwrap();
    assert_eq!(view.state, CheckoutState::PaymentPending);
}

#[tokio::test]
async fn empty_cart_cannot_start_checkout() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());

    let err = checkout
        .start(&session_identity("tok-9"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "El carrito está vacío");
}

#[tokio::test]
async fn inactive_coupon_is_rejected() {
    let db = test_db().await;
    let book = seed_book(&db, "El laberinto de la soledad", 1395, 10).await;
    db.coupons().insert("NAVIDAD25", 25, false).await.unwrap();

    let carts = CartService::new(db.clone());
    let checkout = CheckoutService::new(db.clone(), SimulatedGateway::instant());
    let identity = session_identity("tok-10");

    carts.add_item(&identity, &book.id, 1).await.unwrap();
    let view = checkout.start(&identity).await.unwrap();

    let err = checkout
        .apply_coupon(&view.session_id, "NAVIDAD25")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);

    let err = checkout
        .apply_coupon(&view.session_id, "NOEXISTE")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}
