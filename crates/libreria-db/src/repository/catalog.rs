//! # Catalog Taxonomy Repositories
//!
//! Categories, authors, and publishers are plain taxonomy rows with the
//! same CRUD shape, so their repositories live together here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use libreria_core::{Author, Category, Publisher};

// =============================================================================
// Categories
// =============================================================================

/// Repository for category rows.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already exists
    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(name = %category.name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Renames a category.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Deletes a category.
    ///
    /// Books referencing the category keep it alive: the FK constraint
    /// turns the delete into a `ForeignKeyViolation`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Authors
// =============================================================================

/// Repository for author rows.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuthorRepository { pool }
    }

    /// Lists all authors ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Author>> {
        let authors =
            sqlx::query_as::<_, Author>("SELECT id, name, created_at FROM authors ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(authors)
    }

    /// Gets an author by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Author>> {
        let author =
            sqlx::query_as::<_, Author>("SELECT id, name, created_at FROM authors WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(author)
    }

    /// Inserts a new author.
    pub async fn insert(&self, name: &str) -> DbResult<Author> {
        let author = Author {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(name = %author.name, "Inserting author");

        sqlx::query("INSERT INTO authors (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&author.id)
            .bind(&author.name)
            .bind(author.created_at)
            .execute(&self.pool)
            .await?;

        Ok(author)
    }

    /// Renames an author.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE authors SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Author", id));
        }

        Ok(())
    }

    /// Deletes an author. Link rows in book_authors cascade away.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Author", id));
        }

        Ok(())
    }
}

// =============================================================================
// Publishers
// =============================================================================

/// Repository for publisher rows.
#[derive(Debug, Clone)]
pub struct PublisherRepository {
    pool: SqlitePool,
}

impl PublisherRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PublisherRepository { pool }
    }

    /// Lists all publishers ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Publisher>> {
        let publishers = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, created_at FROM publishers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(publishers)
    }

    /// Gets a publisher by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Publisher>> {
        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, created_at FROM publishers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(publisher)
    }

    /// Inserts a new publisher.
    pub async fn insert(&self, name: &str) -> DbResult<Publisher> {
        let publisher = Publisher {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(name = %publisher.name, "Inserting publisher");

        sqlx::query("INSERT INTO publishers (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&publisher.id)
            .bind(&publisher.name)
            .bind(publisher.created_at)
            .execute(&self.pool)
            .await?;

        Ok(publisher)
    }

    /// Renames a publisher.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE publishers SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Publisher", id));
        }

        Ok(())
    }

    /// Deletes a publisher.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM publishers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Publisher", id));
        }

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

    #[tokio::test]
    async fn test_category_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let novela = repo.insert("Novela").await.unwrap();
        repo.insert("Ensayo").await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by name
        assert_eq!(all[0].name, "Ensayo");

        repo.update(&novela.id, "Novela histórica").await.unwrap();
        let fetched = repo.get_by_id(&novela.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Novela histórica");

        repo.delete(&novela.id).await.unwrap();
        assert!(repo.get_by_id(&novela.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_category_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.insert("Poesía").await.unwrap();
        let err = repo.insert("Poesía").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_author_and_publisher_insert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let author = db.authors().insert("Ana María Matute").await.unwrap();
        assert!(db.authors().get_by_id(&author.id).await.unwrap().is_some());

        let publisher = db.publishers().insert("Editorial Destino").await.unwrap();
        assert!(db
            .publishers()
            .get_by_id(&publisher.id)
            .await
            .unwrap()
            .is_some());
    }
}
