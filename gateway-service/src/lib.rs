pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{GatewayConfig, StorageConfig};
use crate::middleware::{
    admin_api_auth_middleware, session_attach_middleware, session_redirect_middleware,
    user_api_auth_middleware, whitelist_middleware,
};
use crate::services::path_pattern::PathPattern;
use crate::services::{
    Clock, InMemoryStore, MongoDb, PwdDigest, Repositories, Services, Argon2PwdDigest,
    TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub services: Services,
    pub tokens: TokenService,
    pub clock: Arc<dyn Clock>,
    pub whitelist: Arc<Vec<PathPattern>>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        repos: Repositories,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let digest: Arc<dyn PwdDigest> =
            Arc::new(Argon2PwdDigest::new(config.user.default_password.clone()));
        let tokens = TokenService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let whitelist = config
            .security
            .whitelist
            .iter()
            .map(|p| PathPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid whitelist: {}", e)))?;

        tracing::debug!(whitelist = ?config.security.whitelist, "Application state assembled");

        Ok(Self {
            services: Services::new(repos, digest),
            tokens,
            clock,
            whitelist: Arc::new(whitelist),
            config,
        })
    }
}

/// Opens the configured storage backend.
pub async fn connect_repositories(storage: &StorageConfig) -> Result<Repositories, AppError> {
    match storage {
        StorageConfig::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Repositories::from_store(InMemoryStore::new()))
        }
        StorageConfig::Mongo(mongo) => {
            let db = MongoDb::connect(&mongo.uri, &mongo.database).await?;
            db.initialize_indexes().await?;
            Ok(Repositories::from_store(db))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Served without a session
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/login",
            get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route("/admin", get(handlers::admin_auth::index))
        .route("/admin/login", post(handlers::admin_auth::login));

    let page_routes = Router::new()
        .route("/", get(handlers::auth::index))
        .layer(from_fn_with_state(state.clone(), session_redirect_middleware));

    let user_api_routes = Router::new()
        .route("/logout", get(handlers::auth::logout))
        .route("/change_pwd", post(handlers::auth::change_pwd))
        .route("/refresh_token", get(handlers::auth::refresh_token))
        .route(
            "/filter_apis",
            get(handlers::auth::filter_apis).post(handlers::auth::filter_apis),
        )
        .route("/authorize", get(handlers::auth::authorize))
        .layer(from_fn(user_api_auth_middleware))
        .layer(from_fn_with_state(state.clone(), session_attach_middleware));

    let admin_api_routes = Router::new()
        .route("/admin/apis/logout", post(handlers::admin_auth::logout))
        .route("/admin/apis/change_pwd", post(handlers::admin_auth::change_pwd))
        .route("/admin/apis/refresh_token", get(handlers::admin_auth::refresh_token))
        .route(
            "/admin/apis/org",
            get(handlers::org::get_tree).put(handlers::org::create_or_update),
        )
        .route(
            "/admin/apis/org/:id",
            get(handlers::org::get).delete(handlers::org::delete),
        )
        .route("/admin/apis/org/:id/exist", get(handlers::org::exist))
        .route(
            "/admin/apis/user",
            get(handlers::user::get_users).put(handlers::user::create_or_update),
        )
        .route(
            "/admin/apis/user/:id",
            get(handlers::user::get).delete(handlers::user::delete),
        )
        .route("/admin/apis/user/:id/exist", get(handlers::user::exist))
        .route(
            "/admin/apis/role",
            get(handlers::role::get_all).put(handlers::role::create_or_update),
        )
        .route(
            "/admin/apis/role/:id",
            get(handlers::role::get).delete(handlers::role::delete),
        )
        .route("/admin/apis/role/:id/exist", get(handlers::role::exist))
        .route(
            "/admin/apis/svc",
            get(handlers::svc::get_all).put(handlers::svc::create_or_update),
        )
        .route(
            "/admin/apis/svc/:id",
            get(handlers::svc::get)
                .patch(handlers::svc::change_id)
                .delete(handlers::svc::delete),
        )
        .layer(from_fn(admin_api_auth_middleware))
        .layer(from_fn_with_state(state.clone(), session_attach_middleware));

    let allowed_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(user_api_routes)
        .merge(admin_api_routes)
        // Whitelist runs first in the pipeline
        .layer(from_fn_with_state(state.clone(), whitelist_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
}
