//! # Book Repository
//!
//! Database operations for the catalog's books and their author links.
//!
//! ## Key Operations
//! - Paginated listing of active books, optionally filtered by category
//! - CRUD with soft delete (historical orders keep their references)
//! - Author link management (book_authors join table)

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use libreria_core::{Author, Book};

/// Repository for book database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
///
/// let page = repo.list_active(1, 20, None).await?;
/// let book = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

const BOOK_COLUMNS: &str = r#"
    id, isbn, title, description, price_cents, stock,
    category_id, publisher_id, is_active, on_sale, sale_discount_pct,
    created_at, updated_at
"#;

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists active books for the storefront, newest first.
    ///
    /// ## Arguments
    /// * `page` - 1-based page number
    /// * `limit` - page size
    /// * `category_id` - optional category filter
    pub async fn list_active(
        &self,
        page: i64,
        limit: i64,
        category_id: Option<&str>,
    ) -> DbResult<Vec<Book>> {
        let offset = (page - 1) * limit;

        debug!(page, limit, ?category_id, "Listing books");

        let books = match category_id {
            Some(category) => {
                sqlx::query_as::<_, Book>(&format!(
                    r#"
                    SELECT {BOOK_COLUMNS}
                    FROM books
                    WHERE is_active = 1 AND category_id = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2 OFFSET ?3
                    "#
                ))
                .bind(category)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Book>(&format!(
                    r#"
                    SELECT {BOOK_COLUMNS}
                    FROM books
                    WHERE is_active = 1
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

        Ok(books)
    }

    /// Counts active books, with the same optional category filter as
    /// [`Self::list_active`]. Used to build the pagination envelope.
    pub async fn count_active(&self, category_id: Option<&str>) -> DbResult<i64> {
        let count: i64 = match category_id {
            Some(category) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM books WHERE is_active = 1 AND category_id = ?1",
                )
                .bind(category)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_active = 1")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Gets a book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found (active or not)
    /// * `Ok(None)` - Book not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Gets a book by its ISBN.
    pub async fn get_by_isbn(&self, isbn: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE isbn = ?1
            "#
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Inserts a new book.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - ISBN already exists
    pub async fn insert(&self, book: &Book) -> DbResult<()> {
        debug!(isbn = %book.isbn, "Inserting book");

        sqlx::query(
            r#"
            INSERT INTO books (
                id, isbn, title, description, price_cents, stock,
                category_id, publisher_id, is_active, on_sale, sale_discount_pct,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&book.id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.price_cents)
        .bind(book.stock)
        .bind(&book.category_id)
        .bind(&book.publisher_id)
        .bind(book.is_active)
        .bind(book.on_sale)
        .bind(book.sale_discount_pct)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing book.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Book doesn't exist
    pub async fn update(&self, book: &Book) -> DbResult<()> {
        debug!(id = %book.id, "Updating book");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books SET
                isbn = ?2,
                title = ?3,
                description = ?4,
                price_cents = ?5,
                stock = ?6,
                category_id = ?7,
                publisher_id = ?8,
                is_active = ?9,
                on_sale = ?10,
                sale_discount_pct = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&book.id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.price_cents)
        .bind(book.stock)
        .bind(&book.category_id)
        .bind(&book.publisher_id)
        .bind(book.is_active)
        .bind(book.on_sale)
        .bind(book.sale_discount_pct)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", &book.id));
        }

        Ok(())
    }

    /// Soft-deletes a book by setting is_active = false.
    ///
    /// Historical orders and carts still reference the row; the stock gate
    /// rejects inactive books so no new line can be created.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting book");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        Ok(())
    }

    /// Replaces the author links of a book.
    pub async fn set_authors(&self, book_id: &str, author_ids: &[String]) -> DbResult<()> {
        debug!(book_id = %book_id, count = author_ids.len(), "Setting book authors");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_authors WHERE book_id = ?1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        for author_id in author_ids {
            sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2)")
                .bind(book_id)
                .bind(author_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists the authors of a book.
    pub async fn authors_of(&self, book_id: &str) -> DbResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name, a.created_at
            FROM authors a
            INNER JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = ?1
            ORDER BY a.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Counts active books (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new book ID.
pub fn generate_book_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_book(isbn: &str, stock: i64) -> Book {
        let now = Utc::now();
        Book {
            id: generate_book_id(),
            isbn: isbn.to_string(),
            title: format!("Libro {isbn}"),
            description: Some("Una descripción".to_string()),
            price_cents: 1995,
            stock,
            category_id: None,
            publisher_id: None,
            is_active: true,
            on_sale: false,
            sale_discount_pct: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.books();

        let book = sample_book("9780000000001", 5);
        repo.insert(&book).await.unwrap();

        let fetched = repo.get_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(fetched.isbn, book.isbn);
        assert_eq!(fetched.stock, 5);
        assert!(fetched.is_active);

        let by_isbn = repo.get_by_isbn("9780000000001").await.unwrap();
        assert!(by_isbn.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_isbn_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.books();

        repo.insert(&sample_book("9780000000002", 1)).await.unwrap();
        let err = repo
            .insert(&sample_book("9780000000002", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.books();

        let book = sample_book("9780000000003", 1);
        repo.insert(&book).await.unwrap();
        assert_eq!(repo.count_active(None).await.unwrap(), 1);

        repo.soft_delete(&book.id).await.unwrap();
        assert_eq!(repo.count_active(None).await.unwrap(), 0);

        // Still reachable by id for history
        let fetched = repo.get_by_id(&book.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.books();

        let ghost = sample_book("9780000000004", 1);
        assert!(matches!(
            repo.update(&ghost).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
