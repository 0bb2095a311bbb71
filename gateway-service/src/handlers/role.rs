use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::ExistResponse;
use crate::models::Role;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.services.roles.get_all().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, AppError> {
    state
        .services
        .roles
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Role {} not found", id)))
}

pub async fn exist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistResponse>, AppError> {
    let exist = state.services.roles.exist(&id).await?;
    Ok(Json(ExistResponse { exist }))
}

pub async fn create_or_update(
    State(state): State<AppState>,
    ValidatedJson(role): ValidatedJson<Role>,
) -> Result<Json<Role>, AppError> {
    let saved = state.services.roles.create_or_update(role).await?;
    Ok(Json(saved))
}

/// Deletes the role after removing it from every user.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.roles.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
