//! # Order Routes
//!
//! `/pedidos` - order history and back-office status management.
//!
//! | Method | Path                 | Description                               |
//! |--------|----------------------|-------------------------------------------|
//! | GET    | /pedidos             | Paginated orders; identity header filters |
//! | GET    | /pedidos/:id         | Order with line items                     |
//! | PUT    | /pedidos/:id/estado  | Advance the order status                  |
//!
//! Orders are immutable after confirmation except for the status field,
//! and status changes must follow the lifecycle.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use libreria_core::{CoreError, Order, OrderItem, OrderStatus};

use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::state::{AppState, MaybeIdentity};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(detail))
        .route("/{id}/estado", put(update_status))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetailDto {
    #[serde(flatten)]
    order: Order,
    items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusRequest {
    status: OrderStatus,
}

// =============================================================================
// Handlers
// =============================================================================

/// Lists orders, newest first. When the caller sends an identity header
/// only their orders are returned; without one the full list is served
/// (back-office view).
async fn list(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Order>>, ApiError> {
    let (page, limit) = params.normalize();
    debug!(page, limit, filtered = identity.is_some(), "GET /pedidos");

    let orders = state
        .db
        .orders()
        .list(page, limit, identity.as_ref())
        .await?;
    let total = state.db.orders().count(identity.as_ref()).await?;

    Ok(Json(Paginated::new(orders, page, limit, total)))
}

/// Order detail with its line snapshots.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailDto>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pedido", &id))?;

    let items = state.db.orders().items(&id).await?;

    Ok(Json(OrderDetailDto { order, items }))
}

/// Moves the order along its lifecycle
/// (pending → processing → shipped → completed, cancellable until shipped).
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderDetailDto>, ApiError> {
    debug!(order_id = %id, status = req.status.as_str(), "PUT /pedidos/:id/estado");

    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pedido", &id))?;

    if !order.status.can_transition_to(req.status) {
        return Err(CoreError::InvalidOrderTransition {
            current: order.status.as_str().to_string(),
            requested: req.status.as_str().to_string(),
        }
        .into());
    }

    state
        .db
        .orders()
        .update_status(&id, order.status, req.status)
        .await?;

    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pedido", &id))?;
    let items = state.db.orders().items(&id).await?;

    Ok(Json(OrderDetailDto { order, items }))
}
