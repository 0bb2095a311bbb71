//! User-facing session endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;
use validator::Validate;

use super::pages::{IndexTemplate, LoginTemplate};
use crate::dtos::auth::{
    AuthorizeQuery, AuthorizeResponse, ChangePwdRequest, ChangePwdResponse, LoginForm, LoginQuery,
};
use crate::dtos::SessionResponse;
use crate::middleware::AuthUser;
use crate::models::Resource;
use crate::services::TokenService;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Local path to continue to after login. Anything that could leave the
/// site falls back to `/`.
pub fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t,
        _ => "/",
    }
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        redirect: query.redirect,
        error: None,
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let rejected = || {
        (
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                redirect: form.redirect.clone(),
                error: Some("Invalid username or password"),
            },
        )
            .into_response()
    };

    if form.validate().is_err() {
        return Ok(rejected());
    }

    let Some(info) = state.services.auth.login(&form.username, &form.password).await? else {
        return Ok(rejected());
    };

    let cookie = state.tokens.issue_cookie(&info, state.clock.now())?;
    let target = safe_redirect(form.redirect.as_deref());

    Ok((jar.add(cookie), Redirect::to(target)).into_response())
}

pub async fn index(AuthUser(info): AuthUser) -> impl IntoResponse {
    IndexTemplate {
        user_id: info.user_id,
        org_id: info.org_id.unwrap_or_else(|| "-".to_string()),
    }
}

pub async fn logout(jar: CookieJar, AuthUser(info): AuthUser) -> impl IntoResponse {
    tracing::info!(user_id = %info.user_id, "User logged out");
    (jar.add(TokenService::clear_cookie(info.is_admin)), Redirect::to("/login"))
}

pub async fn change_pwd(
    State(state): State<AppState>,
    AuthUser(info): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePwdRequest>,
) -> Result<Json<ChangePwdResponse>, AppError> {
    let changed = state
        .services
        .auth
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
    tracing::debug!(user_id = %info.user_id, "Session renewed");

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            user_id: info.user_id,
            expires_in: state.tokens.expiry_seconds(),
        }),
    ))
}

/// Trims a service's advertised API list to what the session allows.
pub async fn filter_apis(
    State(state): State<AppState>,
    AuthUser(info): AuthUser,
    Json(apis): Json<Vec<Resource>>,
) -> Json<Vec<Resource>> {
    Json(state.services.authz.filter_apis(&apis, &info))
}

pub async fn authorize(
    State(state): State<AppState>,
    AuthUser(info): AuthUser,
    Query(query): Query<AuthorizeQuery>,
) -> Json<AuthorizeResponse> {
    let allowed = state.services.authz.authorize(&info, &query.uri, query.op);
    tracing::debug!(
        user_id = %info.user_id,
        uri = %query.uri,
        op = %query.op,
        allowed,
        "Authorization check"
    );
    Json(AuthorizeResponse { allowed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(None), "/");
        assert_eq!(safe_redirect(Some("/orders?page=2")), "/orders?page=2");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
    }
}
