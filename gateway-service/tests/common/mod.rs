//! Shared setup for gateway integration tests: the real router over the
//! in-memory store and a pinned clock.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use gateway_service::{
    build_router,
    config::GatewayConfig,
    models::{Operation, Organization, Resource, Role, Service, User},
    services::{FixedClock, InMemoryStore, Repositories},
    AppState,
};
use http_body_util::BodyExt;
use service_core::config::Config;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const DEFAULT_PASSWORD: &str = "changepwd";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// Fresh application with development defaults and no data.
    pub fn new() -> Self {
        let config = GatewayConfig::from_lookup(Config::default(), |_| None)
            .expect("Failed to build test config");
        let clock = Arc::new(FixedClock::new(t0()));
        let state = AppState::new(
            config,
            Repositories::from_store(InMemoryStore::new()),
            clock.clone(),
        )
        .expect("Failed to build app state");

        Self {
            router: build_router(state.clone()),
            state,
            clock,
        }
    }

    /// Application seeded with one service, two roles, two organizations and
    /// two users (`alice` in `01` holding both roles, `bob` in `0101`).
    pub async fn seeded() -> Self {
        let app = Self::new();
        let services = &app.state.services;

        services.svcs.create_or_update(orders_svc()).await.unwrap();
        services
            .roles
            .create_or_update(Role::new(
                "viewer",
                [Service::new("orders", [Resource::new("/{id}", [Operation::Read])])],
            ))
            .await
            .unwrap();
        services
            .roles
            .create_or_update(Role::new(
                "editor",
                [Service::new(
                    "orders",
                    [Resource::new("/{id}", [Operation::Update])],
                )],
            ))
            .await
            .unwrap();
        services
            .orgs
            .create_or_update(Organization::new("01", "Head office"))
            .await
            .unwrap();
        services
            .orgs
            .create_or_update(Organization::new("0101", "Branch"))
            .await
            .unwrap();
        services
            .users
            .create_or_update(User::new("alice", "01", ["viewer", "editor"]))
            .await
            .unwrap();
        services
            .users
            .create_or_update(User::new("bob", "0101", ["viewer"]))
            .await
            .unwrap();

        app
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, cookie, None)).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: serde_json::Value,
    ) -> Response {
        self.send(request(method, uri, cookie, Some(body))).await
    }

    /// Logs in through the form and returns the `token=...` cookie pair.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!(
                        "username={}&password={}",
                        username, password
                    )))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        token_cookie(&response).expect("login sets the token cookie")
    }

    pub async fn admin_login(&self, password: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/admin/login",
                None,
                serde_json::json!({ "username": "admin", "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        token_cookie(&response).expect("admin login sets the token cookie")
    }
}

pub fn orders_svc() -> Service {
    Service::new(
        "orders",
        [
            Resource::new("/{id}", [Operation::Read, Operation::Update]),
            Resource::new("/list", [Operation::Read]),
        ],
    )
}

pub fn request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// `token=<value>` from the response's `Set-Cookie`, if any.
pub fn token_cookie(response: &Response) -> Option<String> {
    set_cookie(response).map(|c| c.split(';').next().unwrap_or_default().to_string())
}

/// Raw `Set-Cookie` header for the token.
pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("token="))
        .map(str::to_string)
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
