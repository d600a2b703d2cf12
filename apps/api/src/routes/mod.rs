//! # Route Modules
//!
//! One module per REST resource, assembled into the application router.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub mod autores;
pub mod carrito;
pub mod categorias;
pub mod checkout;
pub mod cupones;
pub mod editoriales;
pub mod libros;
pub mod pedidos;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/salud", get(health))
        .nest("/libros", libros::router())
        .nest("/categorias", categorias::router())
        .nest("/autores", autores::router())
        .nest("/editoriales", editoriales::router())
        .nest("/carrito", carrito::router())
        .nest("/checkout", checkout::router())
        .nest("/pedidos", pedidos::router())
        .nest("/cupones", cupones::router())
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Liveness/readiness probe.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let database = state.db.health_check().await;

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    }))
}
