//! # Cart Repository
//!
//! Persistence for carts and their lines.
//!
//! ## Cart Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Ownership                                     │
//! │                                                                         │
//! │  Registered customer ────► carts.customer_id   (unique per customer)    │
//! │  Anonymous visitor ──────► carts.session_token (client-generated,       │
//! │                                                 persisted client-side)  │
//! │                                                                         │
//! │  Exactly one of the two is set (CHECK constraint). The cart row is      │
//! │  created lazily on first interaction and REUSED forever: checkout       │
//! │  deletes the items, never the cart.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use libreria_core::cart::CartLine;

// =============================================================================
// Cart Identity
// =============================================================================

/// Who owns a cart: a registered customer or an anonymous session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIdentity {
    /// Registered customer id.
    Customer(String),
    /// Client-generated opaque session token.
    Session(String),
}

impl CartIdentity {
    /// The customer id, when this is a customer identity.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            CartIdentity::Customer(id) => Some(id),
            CartIdentity::Session(_) => None,
        }
    }

    /// The session token, when this is an anonymous identity.
    pub fn session_token(&self) -> Option<&str> {
        match self {
            CartIdentity::Customer(_) => None,
            CartIdentity::Session(token) => Some(token),
        }
    }
}

// =============================================================================
// Row Types
// =============================================================================

/// A cart row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartRow {
    pub id: String,
    pub customer_id: Option<String>,
    pub session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item row. Converted to/from the core `CartLine` at the
/// repository boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CartItemRow {
    book_id: String,
    title: String,
    unit_price_cents: i64,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl CartItemRow {
    fn into_line(self) -> CartLine {
        CartLine {
            book_id: self.book_id,
            title: self.title,
            unit_price_cents: self.unit_price_cents,
            quantity: self.quantity,
            added_at: self.added_at,
        }
    }
}

// =============================================================================
// Cart Repository
// =============================================================================

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Finds the cart for an identity, creating it lazily on first use.
    pub async fn get_or_create(&self, identity: &CartIdentity) -> DbResult<CartRow> {
        if let Some(existing) = self.find(identity).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let cart = CartRow {
            id: Uuid::new_v4().to_string(),
            customer_id: identity.customer_id().map(str::to_string),
            session_token: identity.session_token().map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        debug!(cart_id = %cart.id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (id, customer_id, session_token, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.customer_id)
        .bind(&cart.session_token)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Finds the cart for an identity without creating one.
    pub async fn find(&self, identity: &CartIdentity) -> DbResult<Option<CartRow>> {
        let cart = match identity {
            CartIdentity::Customer(id) => {
                sqlx::query_as::<_, CartRow>(
                    r#"
                    SELECT id, customer_id, session_token, created_at, updated_at
                    FROM carts WHERE customer_id = ?1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            CartIdentity::Session(token) => {
                sqlx::query_as::<_, CartRow>(
                    r#"
                    SELECT id, customer_id, session_token, created_at, updated_at
                    FROM carts WHERE session_token = ?1
                    "#,
                )
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(cart)
    }

    /// Gets a cart row by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CartRow>> {
        let cart = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, customer_id, session_token, created_at, updated_at
            FROM carts WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Loads the lines of a cart in insertion order.
    pub async fn lines(&self, cart_id: &str) -> DbResult<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT book_id, title, unit_price_cents, quantity, added_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY added_at, book_id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItemRow::into_line).collect())
    }

    /// Writes a line back after a cart mutation. Inserts a new (cart, book)
    /// row or updates quantity, captured price, and subtotal in place.
    pub async fn upsert_line(&self, cart_id: &str, line: &CartLine) -> DbResult<()> {
        debug!(cart_id = %cart_id, book_id = %line.book_id, quantity = line.quantity, "Upserting cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, book_id, title, unit_price_cents, quantity,
                subtotal_cents, added_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (cart_id, book_id) DO UPDATE SET
                quantity = excluded.quantity,
                unit_price_cents = excluded.unit_price_cents,
                subtotal_cents = excluded.subtotal_cents,
                title = excluded.title
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(cart_id)
        .bind(&line.book_id)
        .bind(&line.title)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.subtotal_cents())
        .bind(line.added_at)
        .execute(&self.pool)
        .await?;

        self.touch(cart_id).await
    }

    /// Removes a single line.
    pub async fn delete_line(&self, cart_id: &str, book_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, book_id = %book_id, "Deleting cart line");

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND book_id = ?2")
            .bind(cart_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", book_id));
        }

        self.touch(cart_id).await
    }

    /// Removes all lines. The cart row itself is kept and reused.
    pub async fn clear(&self, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Clearing cart");

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        self.touch(cart_id).await
    }

    /// Bumps the cart's updated_at timestamp.
    async fn touch(&self, cart_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(cart_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn line(book_id: &str, price: i64, qty: i64) -> CartLine {
        CartLine {
            book_id: book_id.to_string(),
            title: format!("Libro {book_id}"),
            unit_price_cents: price,
            quantity: qty,
            added_at: Utc::now(),
        }
    }

    async fn seed_book(db: &Database, id: &str) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO books (id, isbn, title, price_cents, stock, is_active,
                               on_sale, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1000, 10, 1, 0, ?4, ?4)
            "#,
        )
        .bind(id)
        .bind(format!("isbn-{id}"))
        .bind(format!("Libro {id}"))
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_or_create_is_lazy_and_stable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();
        let identity = CartIdentity::Session("tok-123".to_string());

        assert!(repo.find(&identity).await.unwrap().is_none());

        let created = repo.get_or_create(&identity).await.unwrap();
        let again = repo.get_or_create(&identity).await.unwrap();
        assert_eq!(created.id, again.id);
        assert_eq!(created.session_token.as_deref(), Some("tok-123"));
        assert!(created.customer_id.is_none());
    }

    #[tokio::test]
    async fn test_customer_and_session_carts_are_distinct() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let a = repo
            .get_or_create(&CartIdentity::Customer("c-1".to_string()))
            .await
            .unwrap();
        let b = repo
            .get_or_create(&CartIdentity::Session("c-1".to_string()))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_book(&db, "b-1").await;
        let repo = db.carts();
        let cart = repo
            .get_or_create(&CartIdentity::Session("tok".to_string()))
            .await
            .unwrap();

        repo.upsert_line(&cart.id, &line("b-1", 1000, 2)).await.unwrap();
        repo.upsert_line(&cart.id, &line("b-1", 1200, 5)).await.unwrap();

        let lines = repo.lines(&cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].unit_price_cents, 1200);
    }

    #[tokio::test]
    async fn test_clear_keeps_cart_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_book(&db, "b-1").await;
        let repo = db.carts();
        let cart = repo
            .get_or_create(&CartIdentity::Session("tok".to_string()))
            .await
            .unwrap();

        repo.upsert_line(&cart.id, &line("b-1", 1000, 2)).await.unwrap();
        repo.clear(&cart.id).await.unwrap();

        assert!(repo.lines(&cart.id).await.unwrap().is_empty());
        // The cart entity survives the clear
        assert!(repo.get_by_id(&cart.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_line() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();
        let cart = repo
            .get_or_create(&CartIdentity::Session("tok".to_string()))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete_line(&cart.id, "ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
