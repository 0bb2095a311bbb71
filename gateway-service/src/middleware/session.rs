//! Session filter: resolves the `token` cookie into an [`AuthInfo`].

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::Cookie;

use super::whitelist::Whitelisted;
use crate::models::AuthInfo;
use crate::services::TOKEN_COOKIE;
use crate::AppState;

/// Every `token` cookie value on the request, in header order.
///
/// A browser sends both the `/admin` and the `/` scoped cookie to admin
/// routes, so there can be more than one.
pub fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| {
            Cookie::split_parse(value)
                .filter_map(Result::ok)
                .filter(|cookie| cookie.name() == TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// First valid session on the request, preferring the identity class the
/// path belongs to.
pub fn resolve_session(state: &AppState, req: &Request) -> Option<AuthInfo> {
    let now = state.clock.now();
    let wants_admin = req.uri().path().starts_with("/admin");

    let sessions: Vec<AuthInfo> = session_tokens(req.headers())
        .iter()
        .filter_map(|token| state.tokens.parse(token, now))
        .collect();

    let preferred = sessions.iter().position(|info| info.is_admin == wants_admin);
    let index = preferred.unwrap_or(0);
    sessions.into_iter().nth(index)
}

fn login_redirect(req: &Request) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&format!("/login?redirect={}", urlencoding::encode(target))).into_response()
}

/// Session filter for pages: no valid session means a redirect to the login
/// form carrying the requested URL.
pub async fn session_redirect_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<Whitelisted>().is_some() {
        return next.run(req).await;
    }

    match resolve_session(&state, &req) {
        Some(info) => {
            req.extensions_mut().insert(info);
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "No session, redirecting to login");
            login_redirect(&req)
        }
    }
}

/// Session filter for APIs: attaches a valid session and always continues.
/// The API authorization filter after it decides what a missing one means.
pub async fn session_attach_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<Whitelisted>().is_none() {
        if let Some(info) = resolve_session(&state, &req) {
            req.extensions_mut().insert(info);
        }
    }
    next.run(req).await
}
