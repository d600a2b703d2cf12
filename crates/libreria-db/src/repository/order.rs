//! # Order Repository
//!
//! Order persistence and the checkout confirmation transaction.
//!
//! ## Confirmation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Checkout Confirmation (single transaction)                │
//! │                                                                         │
//! │  1. INSERT order (status = pending)                                     │
//! │  2. Per cart line:                                                      │
//! │     UPDATE books SET stock = stock - qty                                │
//! │       WHERE id = ? AND stock >= qty    ← guarded decrement              │
//! │     └── 0 rows? → ROLLBACK, report stock conflict, nothing written      │
//! │     INSERT order_item (frozen title/isbn/price snapshot)                │
//! │  3. DELETE cart_items (cart row survives)                               │
//! │  4. UPDATE checkout_session → confirmed (guarded on payment_pending)    │
//! │  5. COMMIT                                                              │
//! │                                                                         │
//! │  Concurrent confirmations against the last unit of stock: exactly one   │
//! │  guard succeeds, the loser aborts whole with no partial writes.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cart::CartIdentity;
use crate::repository::checkout::CheckoutSession;
use libreria_core::cart::CartLine;
use libreria_core::{Order, OrderItem, OrderStatus, PaymentMethod, ShippingInfo};

// =============================================================================
// Confirmation Types
// =============================================================================

/// Everything the confirmation transaction needs, gathered by the service
/// layer before the transaction starts.
#[derive(Debug)]
pub struct ConfirmCheckoutParams<'a> {
    pub session: &'a CheckoutSession,
    pub owner: &'a CartIdentity,
    pub shipping: &'a ShippingInfo,
    pub payment_method: PaymentMethod,
    pub lines: &'a [CartLine],
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub coupon_code: Option<String>,
}

/// Outcome of the confirmation transaction.
#[derive(Debug)]
pub enum CheckoutConfirmation {
    /// Order created, stock decremented, cart cleared, session confirmed.
    Confirmed(Order),
    /// A guarded stock decrement failed; the transaction was rolled back
    /// and nothing was written.
    StockConflict {
        book_id: String,
        title: String,
        available: i64,
        requested: i64,
    },
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLUMNS: &str = r#"
    id, customer_id, session_token, checkout_session_id,
    ship_name, ship_surname, ship_street, ship_city,
    ship_postal_code, ship_phone, ship_email,
    payment_method, coupon_code,
    subtotal_cents, discount_cents, total_cents,
    status, created_at, updated_at
"#;

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Runs the checkout confirmation transaction.
    ///
    /// All-or-nothing: a failed stock guard rolls everything back and
    /// reports the conflicting line so the caller can surface the exact
    /// shortage. Stock is decremented here and nowhere else.
    pub async fn confirm_checkout(
        &self,
        params: ConfirmCheckoutParams<'_>,
    ) -> DbResult<CheckoutConfirmation> {
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        debug!(
            session_id = %params.session.id,
            order_id = %order_id,
            lines = params.lines.len(),
            "Confirming checkout"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, session_token, checkout_session_id,
                ship_name, ship_surname, ship_street, ship_city,
                ship_postal_code, ship_phone, ship_email,
                payment_method, coupon_code,
                subtotal_cents, discount_cents, total_cents,
                status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13,
                ?14, ?15, ?16,
                ?17, ?18, ?19
            )
            "#,
        )
        .bind(&order_id)
        .bind(params.owner.customer_id())
        .bind(params.owner.session_token())
        .bind(&params.session.id)
        .bind(params.shipping.name.trim())
        .bind(params.shipping.surname.trim())
        .bind(params.shipping.street.trim())
        .bind(params.shipping.city.trim())
        .bind(params.shipping.postal_code.trim())
        .bind(params.shipping.phone.trim())
        .bind(params.shipping.email.trim())
        .bind(params.payment_method)
        .bind(&params.coupon_code)
        .bind(params.subtotal_cents)
        .bind(params.discount_cents)
        .bind(params.total_cents)
        .bind(OrderStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in params.lines {
            // Guarded decrement: the WHERE clause makes check-and-decrement
            // a single atomic statement
            let result = sqlx::query(
                r#"
                UPDATE books
                SET stock = stock - ?1, updated_at = ?2
                WHERE id = ?3 AND stock >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.book_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: i64 =
                    sqlx::query_scalar("SELECT stock FROM books WHERE id = ?1")
                        .bind(&line.book_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .unwrap_or(0);

                tx.rollback().await?;

                info!(
                    book_id = %line.book_id,
                    available,
                    requested = line.quantity,
                    "Checkout aborted: stock conflict"
                );

                return Ok(CheckoutConfirmation::StockConflict {
                    book_id: line.book_id.clone(),
                    title: line.title.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            let isbn: Option<String> = sqlx::query_scalar("SELECT isbn FROM books WHERE id = ?1")
                .bind(&line.book_id)
                .fetch_optional(&mut *tx)
                .await?;
            let isbn = match isbn {
                Some(isbn) => isbn,
                None => {
                    tx.rollback().await?;
                    return Err(DbError::not_found("Book", &line.book_id));
                }
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, book_id, title_snapshot, isbn_snapshot,
                    unit_price_cents, quantity, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&line.book_id)
            .bind(&line.title)
            .bind(&isbn)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.subtotal_cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Clear the cart's items; the cart row is reused for the next visit
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&params.session.cart_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                state = 'confirmed',
                payment_method = ?2,
                order_id = ?3,
                last_error = NULL,
                updated_at = ?4
            WHERE id = ?1 AND state = 'payment_pending'
            "#,
        )
        .bind(&params.session.id)
        .bind(params.payment_method)
        .bind(&order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found(
                "Checkout session (payment_pending)",
                &params.session.id,
            ));
        }

        tx.commit().await?;

        info!(order_id = %order_id, total_cents = params.total_cents, "Order confirmed");

        let order = Order {
            id: order_id,
            customer_id: params.owner.customer_id().map(str::to_string),
            session_token: params.owner.session_token().map(str::to_string),
            checkout_session_id: params.session.id.clone(),
            ship_name: params.shipping.name.trim().to_string(),
            ship_surname: params.shipping.surname.trim().to_string(),
            ship_street: params.shipping.street.trim().to_string(),
            ship_city: params.shipping.city.trim().to_string(),
            ship_postal_code: params.shipping.postal_code.trim().to_string(),
            ship_phone: params.shipping.phone.trim().to_string(),
            ship_email: params.shipping.email.trim().to_string(),
            payment_method: params.payment_method,
            coupon_code: params.coupon_code,
            subtotal_cents: params.subtotal_cents,
            discount_cents: params.discount_cents,
            total_cents: params.total_cents,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        Ok(CheckoutConfirmation::Confirmed(order))
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all line items of an order, in insertion order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, book_id, title_snapshot, isbn_snapshot,
                   unit_price_cents, quantity, subtotal_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists orders, newest first, optionally filtered to one owner.
    pub async fn list(
        &self,
        page: i64,
        limit: i64,
        owner: Option<&CartIdentity>,
    ) -> DbResult<Vec<Order>> {
        let offset = (page - 1) * limit;

        let orders = match owner {
            Some(CartIdentity::Customer(id)) => {
                sqlx::query_as::<_, Order>(&format!(
                    r#"
                    SELECT {ORDER_COLUMNS}
                    FROM orders
                    WHERE customer_id = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2 OFFSET ?3
                    "#
                ))
                .bind(id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            Some(CartIdentity::Session(token)) => {
                sqlx::query_as::<_, Order>(&format!(
                    r#"
                    SELECT {ORDER_COLUMNS}
                    FROM orders
                    WHERE session_token = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2 OFFSET ?3
                    "#
                ))
                .bind(token)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    r#"
                    SELECT {ORDER_COLUMNS}
                    FROM orders
                    ORDER BY created_at DESC
                    LIMIT ?1 OFFSET ?2
                    "#
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// Counts orders with the same optional owner filter as [`Self::list`].
    pub async fn count(&self, owner: Option<&CartIdentity>) -> DbResult<i64> {
        let count: i64 = match owner {
            Some(CartIdentity::Customer(id)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = ?1")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(CartIdentity::Session(token)) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE session_token = ?1")
                    .bind(token)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Moves an order from one status to another.
    ///
    /// The `WHERE status = from` guard protects against lost updates when
    /// two admins act on the same order.
    pub async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<()> {
        debug!(order_id = %id, from = from.as_str(), to = to.as_str(), "Updating order status");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }
}
