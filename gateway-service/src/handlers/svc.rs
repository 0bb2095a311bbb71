use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::admin::ChangeSvcIdRequest;
use crate::models::Service;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Service>>, AppError> {
    Ok(Json(state.services.svcs.get_all().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Service>, AppError> {
    state
        .services
        .svcs
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Service {} not found", id)))
}

pub async fn create_or_update(
    State(state): State<AppState>,
    ValidatedJson(svc): ValidatedJson<Service>,
) -> Result<Json<Service>, AppError> {
    let saved = state.services.svcs.create_or_update(svc).await?;
    Ok(Json(saved))
}

pub async fn change_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ChangeSvcIdRequest>,
) -> Result<Json<Service>, AppError> {
    if req.new_id != id && state.services.svcs.exist(&req.new_id).await? {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Service {} already exists",
            req.new_id
        )));
    }

    state
        .services
        .svcs
        .change_id(&id, &req.new_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Service {} not found", id)))
}

/// Deletes the service after removing it from every role.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.svcs.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
