use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::admin::UsersQuery;
use crate::dtos::ExistResponse;
use crate::models::User;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Users of one organization with `?org_id=`, every user otherwise.
pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = match query.org_id.as_deref() {
        Some(org_id) => state.services.users.get_by_org_id(org_id).await?,
        None => state.services.users.get_all().await?,
    };
    Ok(Json(users))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    state
        .services
        .users
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", id)))
}

pub async fn exist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistResponse>, AppError> {
    let exist = state.services.users.exist(&id).await?;
    Ok(Json(ExistResponse { exist }))
}

pub async fn create_or_update(
    State(state): State<AppState>,
    ValidatedJson(user): ValidatedJson<User>,
) -> Result<Json<User>, AppError> {
    let saved = state.services.users.create_or_update(user).await?;
    Ok(Json(saved))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
