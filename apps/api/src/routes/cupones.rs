//! # Coupon Routes
//!
//! `/cupones` - back-office management of discount codes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use libreria_core::{validation, CoreError, Coupon};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCouponRequest {
    code: String,
    discount_pct: i64,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCouponRequest {
    discount_pct: i64,
    is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Lists all coupons.
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, ApiError> {
    Ok(Json(state.db.coupons().list_all().await?))
}

/// Coupon detail.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Coupon>, ApiError> {
    let coupon = state
        .db
        .coupons()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cupón", &id))?;
    Ok(Json(coupon))
}

/// Creates a coupon.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    debug!(code = %req.code, "POST /cupones");

    validation::validate_coupon_code(&req.code).map_err(CoreError::from)?;
    validation::validate_discount_pct(req.discount_pct).map_err(CoreError::from)?;

    let coupon = state
        .db
        .coupons()
        .insert(&req.code, req.discount_pct, req.is_active)
        .await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Updates a coupon's discount and active flag. The code itself is
/// immutable: orders snapshot it by value.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCouponRequest>,
) -> Result<Json<Coupon>, ApiError> {
    validation::validate_discount_pct(req.discount_pct).map_err(CoreError::from)?;

    state
        .db
        .coupons()
        .update(&id, req.discount_pct, req.is_active)
        .await?;

    let coupon = state
        .db
        .coupons()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cupón", &id))?;
    Ok(Json(coupon))
}

/// Deletes a coupon.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.coupons().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
