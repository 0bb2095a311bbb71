use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use super::whitelist::Whitelisted;
use crate::models::AuthInfo;

/// User API filter: a session must have been attached by the session filter.
pub async fn user_api_auth_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<Whitelisted>().is_none()
        && req.extensions().get::<AuthInfo>().is_none()
    {
        tracing::debug!(path = %req.uri().path(), "Rejected API call without session");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Authentication required")));
    }
    Ok(next.run(req).await)
}

/// Admin API filter: like the user filter, and the session must be the
/// administrator's.
pub async fn admin_api_auth_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<Whitelisted>().is_some() {
        return Ok(next.run(req).await);
    }

    match req.extensions().get::<AuthInfo>() {
        None => {
            tracing::debug!(path = %req.uri().path(), "Rejected admin API call without session");
            Err(AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
        }
        Some(info) if !info.is_admin => {
            tracing::warn!(
                user_id = %info.user_id,
                path = %req.uri().path(),
                "Non-admin session on admin API"
            );
            Err(AppError::Forbidden(anyhow::anyhow!("Administrator session required")))
        }
        Some(_) => Ok(next.run(req).await),
    }
}

/// Extractor for the session attached by the pipeline.
pub struct AuthUser(pub AuthInfo);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let info = parts
            .extensions
            .get::<AuthInfo>()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(AuthUser(info.clone()))
    }
}
