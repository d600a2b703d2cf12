//! # Cart Service
//!
//! Orchestrates the pricing engine against the persisted cart.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /carrito/items { bookId, quantity }                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Resolve the cart for the identity (lazy create)                     │
//! │  2. Fetch the book (current price + stock feed the pricing engine)      │
//! │  3. Load lines → core Cart → add_item()   ← all rules live in core      │
//! │  4. Persist the affected line, return items + totals                    │
//! │                                                                         │
//! │  A failed step 3 writes nothing: the cart is unchanged on rejection.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use libreria_core::cart::{Cart, CartLine};
use libreria_core::CoreError;
use libreria_db::{CartIdentity, Database};

use crate::error::ApiError;

// =============================================================================
// Response Types
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total_cents(),
        }
    }
}

/// Cart response including items and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub items: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartView {
    fn new(cart_id: String, cart: &Cart) -> Self {
        CartView {
            cart_id,
            totals: CartTotals::from(cart),
            items: cart.lines.clone(),
        }
    }
}

// =============================================================================
// Cart Service
// =============================================================================

/// Service for cart operations.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Returns the current cart, creating it lazily.
    pub async fn view(&self, identity: &CartIdentity) -> Result<CartView, ApiError> {
        let row = self.db.carts().get_or_create(identity).await?;
        let cart = Cart::from_lines(self.db.carts().lines(&row.id).await?);
        Ok(CartView::new(row.id, &cart))
    }

    /// Adds a book to the cart (or merges with the existing line).
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        book_id: &str,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        debug!(book_id = %book_id, quantity, "Adding item to cart");

        let row = self.db.carts().get_or_create(identity).await?;

        let book = self
            .db
            .books()
            .get_by_id(book_id)
            .await?
            .ok_or_else(|| CoreError::BookUnavailable(book_id.to_string()))
            .map_err(ApiError::from)?;

        let mut cart = Cart::from_lines(self.db.carts().lines(&row.id).await?);
        cart.add_item(&book, quantity).map_err(ApiError::from)?;

        let line = cart
            .line(&book.id)
            .ok_or_else(|| ApiError::internal("cart line missing after add"))?;
        self.db.carts().upsert_line(&row.id, line).await?;

        Ok(CartView::new(row.id, &cart))
    }

    /// Sets the quantity of a line; zero removes it.
    pub async fn update_quantity(
        &self,
        identity: &CartIdentity,
        book_id: &str,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        debug!(book_id = %book_id, quantity, "Updating cart line quantity");

        let row = self.db.carts().get_or_create(identity).await?;

        let book = self
            .db
            .books()
            .get_by_id(book_id)
            .await?
            .ok_or_else(|| CoreError::BookUnavailable(book_id.to_string()))
            .map_err(ApiError::from)?;

        let mut cart = Cart::from_lines(self.db.carts().lines(&row.id).await?);
        cart.update_quantity(&book, quantity)
            .map_err(ApiError::from)?;

        match cart.line(&book.id) {
            Some(line) => self.db.carts().upsert_line(&row.id, line).await?,
            // Quantity <= 0 removed the line
            None => self.db.carts().delete_line(&row.id, &book.id).await?,
        }

        Ok(CartView::new(row.id, &cart))
    }

    /// Removes a line from the cart.
    pub async fn remove_item(
        &self,
        identity: &CartIdentity,
        book_id: &str,
    ) -> Result<CartView, ApiError> {
        debug!(book_id = %book_id, "Removing item from cart");

        let row = self.db.carts().get_or_create(identity).await?;

        let mut cart = Cart::from_lines(self.db.carts().lines(&row.id).await?);
        cart.remove_item(book_id).map_err(ApiError::from)?;

        self.db.carts().delete_line(&row.id, book_id).await?;

        Ok(CartView::new(row.id, &cart))
    }

    /// Clears all items. The cart row survives and is reused.
    pub async fn clear(&self, identity: &CartIdentity) -> Result<CartView, ApiError> {
        let row = self.db.carts().get_or_create(identity).await?;
        self.db.carts().clear(&row.id).await?;

        Ok(CartView::new(row.id, &Cart::new()))
    }
}
