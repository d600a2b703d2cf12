//! # Domain Types
//!
//! Core domain types used throughout the Librería backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │      Book       │   │      Order      │   │     Coupon      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  isbn (unique)  │   │  status         │   │  code (unique)  │        │
//! │  │  price_cents    │   │  total_cents    │   │  discount_pct   │        │
//! │  │  stock          │   │  shipping snap  │   │  is_active      │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   OrderStatus   │   │  PaymentMethod  │   │ Category/Author │        │
//! │  │  ─────────────  │   │  ─────────────  │   │ /Publisher      │        │
//! │  │  Pending        │   │  Card           │   │  ─────────────  │        │
//! │  │  Processing     │   │  Wallet         │   │  id + name      │        │
//! │  │  Shipped        │   │  BankTransfer   │   │  taxonomy rows  │        │
//! │  │  Cancelled      │   └─────────────────┘   └─────────────────┘        │
//! │  │  Completed      │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (isbn, coupon code) - human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Book
// =============================================================================

/// A book in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// ISBN - business identifier, unique across the catalog.
    pub isbn: String,

    /// Display title.
    pub title: String,

    /// Optional long description.
    pub description: Option<String>,

    /// List price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units currently in stock. Never negative: decrements are guarded.
    pub stock: i64,

    /// Category this book belongs to.
    pub category_id: Option<String>,

    /// Publisher of this edition.
    pub publisher_id: Option<String>,

    /// Whether the book is active (soft delete).
    pub is_active: bool,

    /// Whether the book is currently on sale.
    pub on_sale: bool,

    /// Sale discount in whole percent (0-100). Only meaningful when
    /// `on_sale` is set.
    pub sale_discount_pct: Option<i64>,

    /// When the book was created.
    pub created_at: DateTime<Utc>,

    /// When the book was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the list price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the price a buyer pays right now: the list price with the
    /// sale discount applied when the book is flagged on sale.
    ///
    /// The cart captures this value at add time; later price or sale
    /// changes do not retroactively alter existing lines.
    pub fn effective_price(&self) -> Money {
        match (self.on_sale, self.sale_discount_pct) {
            (true, Some(pct)) if (1..=100).contains(&pct) => {
                self.price().apply_percentage_discount(pct)
            }
            _ => self.price(),
        }
    }

    /// Effective price in cents.
    #[inline]
    pub fn effective_price_cents(&self) -> i64 {
        self.effective_price().cents()
    }

    /// The stock gate: can `quantity` units be reserved right now?
    ///
    /// True iff the book is active and current stock covers the request.
    /// This is a point-in-time check; the durable decrement at order
    /// confirmation re-validates with a guarded UPDATE.
    pub fn can_reserve(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }
}

// =============================================================================
// Catalog Taxonomies
// =============================================================================

/// A catalog category (e.g. "Novela", "Ensayo").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    /// Display name, unique.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A book author. Linked to books via the `book_authors` join table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Orders are immutable after creation except for this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order confirmed, not yet picked.
    Pending,
    /// Order being prepared for shipment.
    Processing,
    /// Order handed to the carrier.
    Shipped,
    /// Order cancelled before shipment.
    Cancelled,
    /// Order delivered and closed.
    Completed,
}

impl OrderStatus {
    /// Checks whether a status change follows the order lifecycle.
    ///
    /// ```text
    /// Pending ──► Processing ──► Shipped ──► Completed
    ///    │             │
    ///    └──► Cancelled ◄──┘
    /// ```
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Completed)
        )
    }

    /// Lowercase name as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// The closed set of accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    Card,
    /// Digital wallet.
    Wallet,
    /// Bank transfer.
    BankTransfer,
}

// =============================================================================
// Order
// =============================================================================

/// A confirmed order.
///
/// Created once at checkout confirmation with a snapshot of the shipping
/// form and priced lines; immutable afterwards except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Registered customer, when the cart belonged to one.
    pub customer_id: Option<String>,
    /// Anonymous session token, when the cart was anonymous.
    pub session_token: Option<String>,
    /// The checkout session that produced this order.
    pub checkout_session_id: String,
    pub ship_name: String,
    pub ship_surname: String,
    pub ship_street: String,
    pub ship_city: String,
    pub ship_postal_code: String,
    pub ship_phone: String,
    pub ship_email: String,
    pub payment_method: PaymentMethod,
    /// Coupon code applied at checkout, if any.
    pub coupon_code: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze book data at confirmation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub book_id: String,
    /// Title at time of confirmation (frozen).
    pub title_snapshot: String,
    /// ISBN at time of confirmation (frozen).
    pub isbn_snapshot: String,
    /// Unit price in cents at time of confirmation (frozen).
    pub unit_price_cents: i64,
    /// Units ordered.
    pub quantity: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A named discount code, applied at checkout against the order total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    /// Code typed by the customer, unique.
    pub code: String,
    /// Discount in whole percent (0-100).
    pub discount_pct: i64,
    /// Whether the coupon can currently be redeemed.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Checks the coupon can be applied right now.
    pub fn is_redeemable(&self) -> bool {
        self.is_active && (0..=100).contains(&self.discount_pct)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_book(price_cents: i64, stock: i64) -> Book {
        Book {
            id: "b-1".to_string(),
            isbn: "9788437604947".to_string(),
            title: "La Regenta".to_string(),
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
    fn test_stock_gate() {
        let book = test_book(1000, 5);
        assert!(book.can_reserve(1));
        assert!(book.can_reserve(5));
        assert!(!book.can_reserve(6));
    }

    #[test]
    fn test_stock_gate_inactive_book() {
        let mut book = test_book(1000, 5);
        book.is_active = false;
        assert!(!book.can_reserve(1));
    }

    #[test]
    fn test_effective_price_without_sale() {
        let book = test_book(1000, 5);
        assert_eq!(book.effective_price_cents(), 1000);
    }

    #[test]
    fn test_effective_price_with_sale() {
        let mut book = test_book(1000, 5);
        book.on_sale = true;
        book.sale_discount_pct = Some(25);
        assert_eq!(book.effective_price_cents(), 750);
    }

    #[test]
    fn test_sale_flag_without_pct_is_ignored() {
        let mut book = test_book(1000, 5);
        book.on_sale = true;
        book.sale_discount_pct = None;
        assert_eq!(book.effective_price_cents(), 1000);
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn test_coupon_redeemable() {
        let coupon = Coupon {
            id: "c-1".to_string(),
            code: "VERANO10".to_string(),
            discount_pct: 10,
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(coupon.is_redeemable());

        let inactive = Coupon {
            is_active: false,
            ..coupon.clone()
        };
        assert!(!inactive.is_redeemable());

        let out_of_range = Coupon {
            discount_pct: 150,
            ..coupon
        };
        assert!(!out_of_range.is_redeemable());
    }
}
