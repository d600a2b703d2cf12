//! # Publisher Routes
//!
//! `/editoriales` - catalog taxonomy management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use libreria_core::{validation, CoreError, Publisher};

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

/// Lists all publishers.
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Publisher>>, ApiError> {
    Ok(Json(state.db.publishers().list_all().await?))
}

/// Publisher detail.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Publisher>, ApiError> {
    let publisher = state
        .db
        .publishers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Editorial", &id))?;
    Ok(Json(publisher))
}

/// Creates a publisher.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<NamePayload>,
) -> Result<(StatusCode, Json<Publisher>), ApiError> {
    debug!(name = %req.name, "POST /editoriales");

    validation::validate_name(&req.name).map_err(CoreError::from)?;
    let publisher = state.db.publishers().insert(&req.name).await?;
    Ok((StatusCode::CREATED, Json(publisher)))
}

/// Renames a publisher.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NamePayload>,
) -> Result<Json<Publisher>, ApiError> {
    validation::validate_name(&req.name).map_err(CoreError::from)?;
    state.db.publishers().update(&id, &req.name).await?;

    let publisher = state
        .db
        .publishers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Editorial", &id))?;
    Ok(Json(publisher))
}

/// Deletes a publisher.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.publishers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
