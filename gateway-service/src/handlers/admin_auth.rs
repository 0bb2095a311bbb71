use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use super::pages::AdminTemplate;
use crate::dtos::admin::AdminLoginRequest;
use crate::dtos::auth::{ChangePwdRequest, ChangePwdResponse};
use crate::dtos::SessionResponse;
use crate::middleware::AuthUser;
use crate::services::TokenService;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn index() -> impl IntoResponse {
    AdminTemplate {}
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let info = state
        .services
        .admin_auth
        .login(&req.username, &req.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid username or password")))?;

    let now = state.clock.now();
    let cookie = state.tokens.issue_cookie(&info, now)?;

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            user_id: info.user_id,
            expires_in: state.tokens.expiry_seconds(),
        }),
    ))
}

pub async fn logout(jar: CookieJar, AuthUser(info): AuthUser) -> (CookieJar, StatusCode) {
    tracing::info!(user_id = %info.user_id, "Admin logged out");
    (jar.add(TokenService::clear_cookie(true)), StatusCode::NO_CONTENT)
}

pub async fn change_pwd(
    State(state): State<AppState>,
    AuthUser(info): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePwdRequest>,
) -> Result<Json<ChangePwdResponse>, AppError> {
    let changed = state
        .services
        .admin_auth
        .change_password(&info.user_id, &req.old_pwd, &req.new_pwd)
        .await?;

    if !changed {
        return Err(AppError::BadRequest(anyhow::anyhow!("Old password is incorrect")));
    }

    Ok(Json(ChangePwdResponse { changed }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthUser(info): AuthUser,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let cookie = state.tokens.renew_cookie(&info, state.clock.now())?;

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            user_id: info.user_id,
            expires_in: state.tokens.expiry_seconds(),
        }),
    ))
}
