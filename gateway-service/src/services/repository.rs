//! Storage contracts consumed by the gateway.
//!
//! Single values resolve as futures; listings are streams ordered by id
//! ascending. A missing entity is `Ok(None)` or an empty stream, never an
//! error. Every call is its own transaction.

use async_trait::async_trait;
use futures::stream::BoxStream;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{AdminUser, Organization, Role, Service, User};

pub type EntityStream<T> = BoxStream<'static, Result<T, AppError>>;

#[async_trait]
pub trait OrgRepository: Send + Sync {
    /// Organizations whose id starts with `prefix`, ordered by id.
    fn find_by_id_prefix(&self, prefix: &str) -> EntityStream<Organization>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, AppError>;
    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError>;
    async fn save(&self, org: Organization) -> Result<Organization, AppError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    fn find_all(&self) -> EntityStream<User>;
    fn find_by_org_id(&self, org_id: &str) -> EntityStream<User>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError>;
    /// Inserts or replaces the user record, keeping any stored password.
    async fn save(&self, user: User) -> Result<User, AppError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
    async fn delete_by_org_id(&self, org_id: &str) -> Result<(), AppError>;
    /// Stored password digest, `None` for unknown users.
    async fn find_pwd(&self, id: &str) -> Result<Option<String>, AppError>;
    async fn change_pwd(&self, id: &str, pwd: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    fn find_all(&self) -> EntityStream<Role>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Role>, AppError>;
    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError>;
    async fn save(&self, role: Role) -> Result<Role, AppError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SvcRepository: Send + Sync {
    fn find_all(&self) -> EntityStream<Service>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError>;
    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError>;
    async fn save(&self, svc: Service) -> Result<Service, AppError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn get_admin_user(&self) -> Result<Option<AdminUser>, AppError>;
    async fn change_pwd(&self, pwd: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;
}

/// The full set of stores the gateway needs.
#[derive(Clone)]
pub struct Repositories {
    pub orgs: Arc<dyn OrgRepository>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub svcs: Arc<dyn SvcRepository>,
    pub admin: Arc<dyn AdminUserRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// Uses one backend for every store.
    pub fn from_store<S>(store: S) -> Self
    where
        S: OrgRepository
            + UserRepository
            + RoleRepository
            + SvcRepository
            + AdminUserRepository
            + HealthCheck
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            orgs: store.clone(),
            users: store.clone(),
            roles: store.clone(),
            svcs: store.clone(),
            admin: store.clone(),
            health: store,
        }
    }
}
