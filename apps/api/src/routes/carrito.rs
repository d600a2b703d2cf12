//! # Cart Routes
//!
//! `/carrito` - the shopper's cart. Identified by the `X-Customer-Id` or
//! `X-Session-Token` header (exactly one).
//!
//! | Method | Path                     | Description                       |
//! |--------|--------------------------|-----------------------------------|
//! | GET    | /carrito                 | Current cart (created lazily)     |
//! | DELETE | /carrito                 | Clear items (cart row survives)   |
//! | POST   | /carrito/items           | Add a book / merge quantities     |
//! | PUT    | /carrito/items/:libro_id | Set quantity (0 removes the line) |
//! | DELETE | /carrito/items/:libro_id | Remove the line                   |

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::services::cart_service::CartView;
use crate::state::{AppState, Identity};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view).delete(clear))
        .route("/items", post(add_item))
        .route("/items/{libro_id}", put(update_item).delete(remove_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartRequest {
    book_id: String,
    /// Defaults to 1, matching the storefront's one-click add.
    quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateQuantityRequest {
    quantity: i64,
}

/// Gets the current cart contents and totals.
async fn view(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<CartView>, ApiError> {
    debug!("GET /carrito");
    Ok(Json(state.cart_service().view(&identity).await?))
}

/// Adds a book to the cart.
///
/// If the book is already in the cart the quantities merge and the line is
/// re-priced at the book's current price.
async fn add_item(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartView>, ApiError> {
    let quantity = req.quantity.unwrap_or(1);
    debug!(book_id = %req.book_id, quantity, "POST /carrito/items");

    let view = state
        .cart_service()
        .add_item(&identity, &req.book_id, quantity)
        .await?;
    Ok(Json(view))
}

/// Sets the quantity of a cart line. Quantity 0 removes it.
async fn update_item(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(libro_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    debug!(book_id = %libro_id, quantity = req.quantity, "PUT /carrito/items/:libro_id");

    let view = state
        .cart_service()
        .update_quantity(&identity, &libro_id, req.quantity)
        .await?;
    Ok(Json(view))
}

/// Removes a line from the cart.
async fn remove_item(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(libro_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    debug!(book_id = %libro_id, "DELETE /carrito/items/:libro_id");

    let view = state
        .cart_service()
        .remove_item(&identity, &libro_id)
        .await?;
    Ok(Json(view))
}

/// Clears the cart. Only the items are deleted; the cart entity persists
/// and is reused on the next add.
async fn clear(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<CartView>, ApiError> {
    debug!("DELETE /carrito");
    Ok(Json(state.cart_service().clear(&identity).await?))
}
