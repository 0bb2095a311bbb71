//! Organization administration.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::admin::OrgTreeQuery;
use crate::dtos::ExistResponse;
use crate::models::{OrgTree, Organization};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Organization forest, optionally limited to ids starting with `?id=`.
pub async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<OrgTreeQuery>,
) -> Result<Json<Vec<OrgTree>>, AppError> {
    let forest = state.services.orgs.get_tree(query.id.as_deref()).await?;
    Ok(Json(forest))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, AppError> {
    state
        .services
        .orgs
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Organization {} not found", id)))
}

pub async fn exist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistResponse>, AppError> {
    let exist = state.services.orgs.exist(&id).await?;
    Ok(Json(ExistResponse { exist }))
}

pub async fn create_or_update(
    State(state): State<AppState>,
    ValidatedJson(org): ValidatedJson<Organization>,
) -> Result<Json<Organization>, AppError> {
    let saved = state.services.orgs.create_or_update(org).await?;
    Ok(Json(saved))
}

/// Deletes the organization and its users.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.orgs.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
