use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::services::path_pattern::PathPattern;
use crate::AppState;

/// Request extension marking a route that needs no session.
#[derive(Debug, Clone, Copy)]
pub struct Whitelisted;

pub fn is_whitelisted(patterns: &[PathPattern], path: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(path))
}

/// Tags whitelisted requests so the later filters let them through untouched.
pub async fn whitelist_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_whitelisted(&state.whitelist, req.uri().path()) {
        tracing::debug!(path = %req.uri().path(), "Whitelisted route");
        req.extensions_mut().insert(Whitelisted);
    }
    next.run(req).await
}
