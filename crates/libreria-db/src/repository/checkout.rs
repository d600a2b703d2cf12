//! # Checkout Session Repository
//!
//! Persistence for the durable checkout wizard.
//!
//! Every transition UPDATE carries a `WHERE ... AND state = ?` guard so a
//! stale or concurrent request cannot move a session that already left the
//! expected state; zero affected rows surfaces as NotFound and the service
//! re-reads the session to report the real state.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use libreria_core::{CheckoutState, PaymentMethod, ShippingInfo};

// =============================================================================
// Row Type
// =============================================================================

/// A checkout session row.
///
/// Shipping fields are NULL until the first wizard step is accepted;
/// `order_id` is set when the session confirms.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckoutSession {
    pub id: String,
    pub cart_id: String,
    pub state: CheckoutState,
    pub ship_name: Option<String>,
    pub ship_surname: Option<String>,
    pub ship_street: Option<String>,
    pub ship_city: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_phone: Option<String>,
    pub ship_email: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub coupon_code: Option<String>,
    pub coupon_discount_pct: Option<i64>,
    pub order_id: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Reassembles the shipping form, once submitted.
    pub fn shipping(&self) -> Option<ShippingInfo> {
        Some(ShippingInfo {
            name: self.ship_name.clone()?,
            surname: self.ship_surname.clone()?,
            street: self.ship_street.clone()?,
            city: self.ship_city.clone()?,
            postal_code: self.ship_postal_code.clone()?,
            phone: self.ship_phone.clone()?,
            email: self.ship_email.clone()?,
        })
    }
}

const SESSION_COLUMNS: &str = r#"
    id, cart_id, state,
    ship_name, ship_surname, ship_street, ship_city,
    ship_postal_code, ship_phone, ship_email,
    payment_method, coupon_code, coupon_discount_pct,
    order_id, last_error, created_at, updated_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for checkout session operations.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRepository {
    pool: SqlitePool,
}

impl CheckoutSessionRepository {
    /// Creates a new CheckoutSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutSessionRepository { pool }
    }

    /// Creates a new draft session for a cart.
    pub async fn create(&self, cart_id: &str) -> DbResult<CheckoutSession> {
        let now = Utc::now();
        let session = CheckoutSession {
            id: Uuid::new_v4().to_string(),
            cart_id: cart_id.to_string(),
            state: CheckoutState::Draft,
            ship_name: None,
            ship_surname: None,
            ship_street: None,
            ship_city: None,
            ship_postal_code: None,
            ship_phone: None,
            ship_email: None,
            payment_method: None,
            coupon_code: None,
            coupon_discount_pct: None,
            order_id: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        debug!(session_id = %session.id, cart_id = %cart_id, "Creating checkout session");

        sqlx::query(
            r#"
            INSERT INTO checkout_sessions (id, cart_id, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&session.id)
        .bind(&session.cart_id)
        .bind(session.state)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CheckoutSession>> {
        let session = sqlx::query_as::<_, CheckoutSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM checkout_sessions
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Stores the accepted shipping form and advances Draft → PaymentPending.
    pub async fn submit_shipping(&self, id: &str, shipping: &ShippingInfo) -> DbResult<()> {
        debug!(session_id = %id, "Submitting shipping info");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                state = 'payment_pending',
                ship_name = ?2,
                ship_surname = ?3,
                ship_street = ?4,
                ship_city = ?5,
                ship_postal_code = ?6,
                ship_phone = ?7,
                ship_email = ?8,
                updated_at = ?9
            WHERE id = ?1 AND state = 'draft'
            "#,
        )
        .bind(id)
        .bind(shipping.name.trim())
        .bind(shipping.surname.trim())
        .bind(shipping.street.trim())
        .bind(shipping.city.trim())
        .bind(shipping.postal_code.trim())
        .bind(shipping.phone.trim())
        .bind(shipping.email.trim())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Checkout session (draft)", id));
        }

        Ok(())
    }

    /// Steps backwards: PaymentPending → Draft. The stored shipping form is
    /// kept so the storefront can prefill it.
    pub async fn back_to_draft(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                state = 'draft',
                updated_at = ?2
            WHERE id = ?1 AND state = 'payment_pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Checkout session (payment_pending)", id));
        }

        Ok(())
    }

    /// Attaches a validated coupon to the session.
    pub async fn set_coupon(&self, id: &str, code: &str, discount_pct: i64) -> DbResult<()> {
        debug!(session_id = %id, code = %code, "Applying coupon to checkout session");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                coupon_code = ?2,
                coupon_discount_pct = ?3,
                updated_at = ?4
            WHERE id = ?1 AND state IN ('draft', 'payment_pending')
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(discount_pct)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Checkout session (open)", id));
        }

        Ok(())
    }

    /// Records a declined payment attempt. The session stays in
    /// PaymentPending so the customer can retry.
    pub async fn record_payment_failure(
        &self,
        id: &str,
        method: PaymentMethod,
        error: &str,
    ) -> DbResult<()> {
        debug!(session_id = %id, error = %error, "Recording payment failure");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                payment_method = ?2,
                last_error = ?3,
                updated_at = ?4
            WHERE id = ?1 AND state = 'payment_pending'
            "#,
        )
        .bind(id)
        .bind(method)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Checkout session (payment_pending)", id));
        }

        Ok(())
    }

    /// Cancels an open session: Draft/PaymentPending → Failed. Terminal.
    pub async fn mark_failed(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE checkout_sessions SET
                state = 'failed',
                updated_at = ?2
            WHERE id = ?1 AND state IN ('draft', 'payment_pending')
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Checkout session (open)", id));
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
    use crate::repository::cart::CartIdentity;

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

    async fn new_session(db: &Database) -> CheckoutSession {
        let cart = db
            .carts()
            .get_or_create(&CartIdentity::Session("tok".to_string()))
            .await
            .unwrap();
        db.checkout_sessions().create(&cart.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = new_session(&db).await;

        let fetched = db
            .checkout_sessions()
            .get_by_id(&session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.state, CheckoutState::Draft);
        assert!(fetched.shipping().is_none());
    }

    #[tokio::test]
    async fn test_submit_shipping_advances_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = new_session(&db).await;
        let repo = db.checkout_sessions();

        repo.submit_shipping(&session.id, &shipping()).await.unwrap();

        let fetched = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state, CheckoutState::PaymentPending);
        assert_eq!(fetched.shipping().unwrap().email, "ana@example.com");

        // Guard: a second submit hits zero rows
        assert!(matches!(
            repo.submit_shipping(&session.id, &shipping()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_back_to_draft() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = new_session(&db).await;
        let repo = db.checkout_sessions();

        repo.submit_shipping(&session.id, &shipping()).await.unwrap();
        repo.back_to_draft(&session.id).await.unwrap();

        let fetched = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state, CheckoutState::Draft);
        // Shipping form is kept for prefill
        assert!(fetched.shipping().is_some());
    }

    #[tokio::test]
    async fn test_payment_failure_keeps_payment_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = new_session(&db).await;
        let repo = db.checkout_sessions();

        repo.submit_shipping(&session.id, &shipping()).await.unwrap();
        repo.record_payment_failure(&session.id, PaymentMethod::Card, "tarjeta rechazada")
            .await
            .unwrap();

        let fetched = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state, CheckoutState::PaymentPending);
        assert_eq!(fetched.last_error.as_deref(), Some("tarjeta rechazada"));
        assert_eq!(fetched.payment_method, Some(PaymentMethod::Card));
    }

    #[tokio::test]
    async fn test_mark_failed_is_terminal() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = new_session(&db).await;
        let repo = db.checkout_sessions();

        repo.mark_failed(&session.id).await.unwrap();

        let fetched = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state, CheckoutState::Failed);

        assert!(matches!(
            repo.submit_shipping(&session.id, &shipping()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
