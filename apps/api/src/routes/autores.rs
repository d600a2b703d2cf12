//! # Author Routes
//!
//! `/autores` - catalog taxonomy management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use libreria_core::{validation, Author, CoreError};

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

/// Lists all authors.
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Author>>, ApiError> {
    Ok(Json(state.db.authors().list_all().await?))
}

/// Author detail.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let author = state
        .db
        .authors()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Autor", &id))?;
    Ok(Json(author))
}

/// Creates an author.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<NamePayload>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    debug!(name = %req.name, "POST /autores");

    validation::validate_name(&req.name).map_err(CoreError::from)?;
    let author = state.db.authors().insert(&req.name).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Renames an author.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NamePayload>,
) -> Result<Json<Author>, ApiError> {
    validation::validate_name(&req.name).map_err(CoreError::from)?;
    state.db.authors().update(&id, &req.name).await?;

    let author = state
        .db
        .authors()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Autor", &id))?;
    Ok(Json(author))
}

/// Deletes an author and its book links.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.authors().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
