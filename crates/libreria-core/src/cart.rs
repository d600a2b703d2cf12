//! # Cart Pricing Engine
//!
//! The pure cart aggregate: lines keyed by book, captured unit prices,
//! subtotal math, and the stock gate consulted on every mutation.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Storefront Action        API Endpoint             Cart Change          │
//! │  ─────────────────        ────────────             ───────────          │
//! │                                                                         │
//! │  Add book ──────────────► POST /carrito/items ───► add_item()           │
//! │                                                                         │
//! │  Change quantity ───────► PUT /carrito/items/:id ► update_quantity()    │
//! │                           (0 removes the line)                          │
//! │                                                                         │
//! │  Remove line ───────────► DELETE /carrito/items ─► remove_item()        │
//! │                                                                         │
//! │  Empty cart ────────────► DELETE /carrito ───────► clear()              │
//! │                                                                         │
//! │  Checkout success ──────► (confirmation tx) ─────► clear()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `book_id` (adding the same book merges quantities)
//! - Quantity is always >= 1 (update to 0 removes the line)
//! - `subtotal = quantity × unit_price`, recomputed on every mutation
//! - A failed mutation leaves the cart untouched
//! - A merge refreshes the captured unit price to the book's current
//!   effective price; the original capture applies only until the next add

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Book;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart: one book, a quantity, and the unit price captured
/// when the line was created or last merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Book ID (UUID).
    pub book_id: String,

    /// Title at time of adding (for display without a catalog join).
    pub title: String,

    /// Unit price in cents captured at add time. Not live-linked to the
    /// book's price: catalog price changes do not move existing lines.
    pub unit_price_cents: i64,

    /// Units of this book in the cart.
    pub quantity: i64,

    /// When this line was created.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a new cart line from a book and quantity, capturing the
    /// book's current effective price.
    pub fn from_book(book: &Book, quantity: i64) -> Self {
        CartLine {
            book_id: book.id.clone(),
            title: book.title.clone(),
            unit_price_cents: book.effective_price_cents(),
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal: unit price × quantity.
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart aggregate.
///
/// Pure: the persistence layer loads lines into this type, applies one
/// operation, and writes the affected line back. All pricing rules live
/// here and nowhere else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the cart, in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Builds a cart from already-persisted lines.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    /// Adds a book to the cart, merging with an existing line.
    ///
    /// ## Behavior
    /// - Quantity <= 0 is rejected outright
    /// - Inactive books are rejected
    /// - The stock gate checks the *merged* quantity (existing + requested)
    ///   against current stock
    /// - A merge refreshes the unit price to the book's current effective
    ///   price and recomputes the subtotal
    /// - A new line captures the current effective price
    pub fn add_item(&mut self, book: &Book, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity));
        }

        if !book.is_active {
            return Err(CoreError::BookUnavailable(book.id.clone()));
        }

        let existing_qty = self
            .line(&book.id)
            .map(|line| line.quantity)
            .unwrap_or(0);
        let merged = existing_qty + quantity;

        if merged > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: merged,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !book.can_reserve(merged) {
            return Err(CoreError::InsufficientStock {
                title: book.title.clone(),
                available: book.stock,
                requested: merged,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book.id) {
            line.quantity = merged;
            line.unit_price_cents = book.effective_price_cents();
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_book(book, quantity));
        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - Quantity <= 0 removes the line
    /// - Otherwise the stock gate checks the new quantity and the subtotal
    ///   is recomputed; the captured unit price is kept
    pub fn update_quantity(&mut self, book: &Book, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(&book.id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !book.is_active {
            return Err(CoreError::BookUnavailable(book.id.clone()));
        }

        if !book.can_reserve(quantity) {
            return Err(CoreError::InsufficientStock {
                title: book.title.clone(),
                available: book.stock,
                requested: quantity,
            });
        }

        match self.lines.iter_mut().find(|l| l.book_id == book.id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotFound(book.id.clone())),
        }
    }

    /// Removes a line from the cart by book ID.
    pub fn remove_item(&mut self, book_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.book_id != book_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(book_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines. The cart itself survives: only items are deleted.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns the line for a book, if present.
    pub fn line(&self, book_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.book_id == book_id)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Cart total: sum of all line subtotals.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.subtotal_cents()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_book(id: &str, price_cents: i64, stock: i64) -> Book {
        Book {
            id: id.to_string(),
            isbn: format!("978-{}", id),
            title: format!("Libro {}", id),
            description: None,
            price_cents,
            stock,
            category_id: None,
            publisher_id: None,
            is_active: true,
            on_sale: false,
            sale_discount_pct: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        let book = test_book("1", 999, 10);

        cart.add_item(&book, 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_cents(), 1998);
    }

    #[test]
    fn test_sequential_adds_merge_quantities() {
        // q1 + q2 for the same (cart, book) → one line with q1+q2 units
        // priced at the current unit price
        let mut cart = Cart::new();
        let book = test_book("1", 999, 10);

        cart.add_item(&book, 2).unwrap();
        cart.add_item(&book, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        let line = cart.line("1").unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.subtotal_cents(), 5 * 999);
    }

    #[test]
    fn test_merge_refreshes_unit_price() {
        let mut cart = Cart::new();
        let mut book = test_book("1", 1000, 10);

        cart.add_item(&book, 1).unwrap();
        assert_eq!(cart.line("1").unwrap().unit_price_cents, 1000);

        // Catalog price changed between the two adds
        book.price_cents = 1200;
        cart.add_item(&book, 1).unwrap();

        let line = cart.line("1").unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price_cents, 1200);
        assert_eq!(line.subtotal_cents(), 2400);
    }

    #[test]
    fn test_add_captures_sale_price() {
        let mut cart = Cart::new();
        let mut book = test_book("1", 1000, 10);
        book.on_sale = true;
        book.sale_discount_pct = Some(20);

        cart.add_item(&book, 1).unwrap();
        assert_eq!(cart.line("1").unwrap().unit_price_cents, 800);
    }

    #[test]
    fn test_add_rejects_invalid_quantity() {
        let mut cart = Cart::new();
        let book = test_book("1", 999, 10);

        assert!(matches!(
            cart.add_item(&book, 0),
            Err(CoreError::InvalidQuantity(0))
        ));
        assert!(matches!(
            cart.add_item(&book, -3),
            Err(CoreError::InvalidQuantity(-3))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_inactive_book() {
        let mut cart = Cart::new();
        let mut book = test_book("1", 999, 10);
        book.is_active = false;

        assert!(matches!(
            cart.add_item(&book, 1),
            Err(CoreError::BookUnavailable(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_over_stock_rejected_and_cart_unchanged() {
        let mut cart = Cart::new();
        let book = test_book("1", 999, 2);

        let err = cart.add_item(&book, 3).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_five_add_three_then_three_more() {
        // stock=5: add 3 → ok; add 3 more → rejected, line stays at 3
        let mut cart = Cart::new();
        let book = test_book("1", 1000, 5);

        cart.add_item(&book, 3).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, 3);

        let err = cart.add_item(&book, 3).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(cart.line("1").unwrap().quantity, 3);
        assert_eq!(cart.total_cents(), 3000);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let a = test_book("a", 10000, 10);
        let b = test_book("b", 5000, 10);

        cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 1).unwrap();
        let before = cart.total_cents();
        let line_subtotal = cart.line("a").unwrap().subtotal_cents();

        cart.update_quantity(&a, 0).unwrap();

        assert!(cart.line("a").is_none());
        assert_eq!(cart.total_cents(), before - line_subtotal);
    }

    #[test]
    fn test_update_quantity_checks_stock() {
        let mut cart = Cart::new();
        let book = test_book("1", 1000, 4);

        cart.add_item(&book, 2).unwrap();
        assert!(matches!(
            cart.update_quantity(&book, 5),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(cart.line("1").unwrap().quantity, 2);

        cart.update_quantity(&book, 4).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, 4);
    }

    #[test]
    fn test_update_quantity_keeps_captured_price() {
        let mut cart = Cart::new();
        let mut book = test_book("1", 1000, 10);

        cart.add_item(&book, 1).unwrap();
        book.price_cents = 1500;

        cart.update_quantity(&book, 3).unwrap();
        let line = cart.line("1").unwrap();
        assert_eq!(line.unit_price_cents, 1000);
        assert_eq!(line.subtotal_cents(), 3000);
    }

    #[test]
    fn test_update_missing_line() {
        let mut cart = Cart::new();
        let book = test_book("1", 1000, 10);

        assert!(matches!(
            cart.update_quantity(&book, 2),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_remove_and_totals() {
        // A (qty 2, 100) + B (qty 1, 50) → total 250; remove A → total 50
        let mut cart = Cart::new();
        let a = test_book("a", 10000, 10);
        let b = test_book("b", 5000, 10);

        cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 1).unwrap();
        assert_eq!(cart.total_cents(), 25000);

        cart.remove_item("a").unwrap();
        assert_eq!(cart.total_cents(), 5000);
        assert_eq!(cart.total_quantity(), 1);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_remove_missing_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.remove_item("nope"),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        let book = test_book("1", 999, 10);

        cart.add_item(&book, 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
        assert_eq!(cart.total_quantity(), 0);
        assert_eq!(cart.line_count(), 0);
    }

    #[test]
    fn test_quantity_ceiling() {
        let mut cart = Cart::new();
        let book = test_book("1", 100, 100_000);

        assert!(matches!(
            cart.add_item(&book, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));

        cart.add_item(&book, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_item(&book, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }
}
