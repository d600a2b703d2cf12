//! # Coupon Repository
//!
//! Database operations for discount coupons.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use libreria_core::Coupon;

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Lists all coupons, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, discount_pct, is_active, created_at
            FROM coupons
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, discount_pct, is_active, created_at
            FROM coupons
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Gets a coupon by its code (the string customers type).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, discount_pct, is_active, created_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Inserts a new coupon.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, code: &str, discount_pct: i64, is_active: bool) -> DbResult<Coupon> {
        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            discount_pct,
            is_active,
            created_at: Utc::now(),
        };

        debug!(code = %coupon.code, discount_pct, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount_pct, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_pct)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Updates a coupon's discount and active flag.
    pub async fn update(&self, id: &str, discount_pct: i64, is_active: bool) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                discount_pct = ?2,
                is_active = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(discount_pct)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }

    /// Deletes a coupon. Orders that already used the code keep its string
    /// snapshot (orders.coupon_code is not a foreign key).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
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
    async fn test_insert_and_lookup_by_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();

        repo.insert("VERANO10", 10, true).await.unwrap();

        let coupon = repo.get_by_code("VERANO10").await.unwrap().unwrap();
        assert_eq!(coupon.discount_pct, 10);
        assert!(coupon.is_redeemable());

        assert!(repo.get_by_code("NOEXISTE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();

        repo.insert("UNICO", 5, true).await.unwrap();
        let err = repo.insert("UNICO", 10, true).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();

        let coupon = repo.insert("CADUCADO", 20, true).await.unwrap();
        repo.update(&coupon.id, 20, false).await.unwrap();

        let fetched = repo.get_by_code("CADUCADO").await.unwrap().unwrap();
        assert!(!fetched.is_active);
        assert!(!fetched.is_redeemable());
    }
}
