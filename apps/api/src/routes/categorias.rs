//! # Category Routes
//!
//! `/categorias` - catalog taxonomy management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use libreria_core::{validation, Category, CoreError};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct NamePayload {
    name: String,
}

/// Lists all categories.
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.categories().list_all().await?))
}

/// Category detail.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Categoría", &id))?;
    Ok(Json(category))
}

/// Creates a category.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<NamePayload>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    debug!(name = %req.name, "POST /categorias");

    validation::validate_name(&req.name).map_err(CoreError::from)?;
    let category = state.db.categories().insert(&req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Renames a category.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NamePayload>,
) -> Result<Json<Category>, ApiError> {
    validation::validate_name(&req.name).map_err(CoreError::from)?;
    state.db.categories().update(&id, &req.name).await?;

    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Categoría", &id))?;
    Ok(Json(category))
}

/// Deletes a category. Rejected with 400 while books still reference it.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
