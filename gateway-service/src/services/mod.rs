//! Services layer for the gateway.
//!
//! The pure authorization core (`org_tree`, `permissions`, `path_pattern`,
//! `path_authorizer`, `token`) has no I/O. Everything else talks to storage
//! through the traits in [`repository`].

pub mod auth;
pub mod authorization;
pub mod clock;
pub mod database;
pub mod digest;
pub mod memory;
pub mod org;
pub mod org_tree;
pub mod path_authorizer;
pub mod path_pattern;
pub mod permissions;
pub mod repository;
pub mod role;
pub mod svc;
pub mod token;
pub mod user;

use std::sync::Arc;

pub use auth::{AdminAuthService, AuthenticationService};
pub use authorization::AuthorizationService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use database::MongoDb;
pub use digest::{PwdDigest, Argon2PwdDigest};
pub use memory::InMemoryStore;
pub use org::OrgService;
pub use repository::{HealthCheck, Repositories};
pub use role::RoleService;
pub use svc::SvcService;
pub use token::{TokenService, TOKEN_COOKIE};
pub use user::UserService;

/// Domain services wired over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub orgs: OrgService,
    pub users: UserService,
    pub roles: RoleService,
    pub svcs: SvcService,
    pub authz: AuthorizationService,
    pub auth: AuthenticationService,
    pub admin_auth: AdminAuthService,
    pub health: Arc<dyn HealthCheck>,
}

impl Services {
    pub fn new(repos: Repositories, digest: Arc<dyn PwdDigest>) -> Self {
        let users = UserService::new(repos.users, digest.clone());
        let orgs = OrgService::new(repos.orgs, users.clone());
        let roles = RoleService::new(repos.roles, users.clone());
        let svcs = SvcService::new(repos.svcs, roles.clone());
        let authz = AuthorizationService::new(roles.clone());
        let auth = AuthenticationService::new(users.clone(), authz.clone(), digest.clone());
        let admin_auth = AdminAuthService::new(repos.admin, digest);

        Self {
            orgs,
            users,
            roles,
            svcs,
            authz,
            auth,
            admin_auth,
            health: repos.health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operation, Organization, Resource, Role, Service, User};
    use secrecy::SecretString;

    fn services() -> Services {
        Services::new(
            Repositories::from_store(InMemoryStore::new()),
            Arc::new(Argon2PwdDigest::new(SecretString::new("changepwd".to_string()))),
        )
    }

    fn orders_svc() -> Service {
        Service::new(
            "orders",
            [
                Resource::new("/list", [Operation::Read]),
                Resource::new("/{id}", [Operation::Read, Operation::Update]),
            ],
        )
    }

    async fn seed(s: &Services) {
        s.svcs.create_or_update(orders_svc()).await.unwrap();
        s.roles
            .create_or_update(Role::new("clerk", [orders_svc()]))
            .await
            .unwrap();
        s.roles
            .create_or_update(Role::new(
                "auditor",
                [Service::new("billing", [Resource::new("/report", [Operation::Read])])],
            ))
            .await
            .unwrap();
        s.orgs
            .create_or_update(Organization::new("01", "Head office"))
            .await
            .unwrap();
        s.orgs
            .create_or_update(Organization::new("0101", "Branch"))
            .await
            .unwrap();
        s.users
            .create_or_update(User::new("alice", "01", ["clerk", "auditor"]))
            .await
            .unwrap();
        s.users
            .create_or_update(User::new("bob", "0101", ["clerk"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_merges_role_permissions() {
        let s = services();
        seed(&s).await;

        let info = s.auth.login("alice", "changepwd").await.unwrap().unwrap();
        assert_eq!(info.user_id, "alice");
        assert_eq!(info.org_id.as_deref(), Some("01"));
        assert!(!info.is_admin);

        let uris: Vec<&str> = info.resources.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/billing/report", "/orders/list", "/orders/{id}"]);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let s = services();
        seed(&s).await;

        assert!(s.auth.login("alice", "wrong").await.unwrap().is_none());
        assert!(s.auth.login("nobody", "changepwd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_without_roles_logs_in_with_no_permissions() {
        let s = services();
        s.users
            .create_or_update(User::new("carol", "01", Vec::<String>::new()))
            .await
            .unwrap();

        let info = s.auth.login("carol", "changepwd").await.unwrap().unwrap();
        assert!(info.resources.is_empty());
    }

    #[tokio::test]
    async fn test_change_password() {
        let s = services();
        seed(&s).await;

        assert!(!s.auth.change_password("alice", "wrong", "next").await.unwrap());
        assert!(s.auth.change_password("alice", "changepwd", "next").await.unwrap());
        assert!(s.auth.login("alice", "changepwd").await.unwrap().is_none());
        assert!(s.auth.login("alice", "next").await.unwrap().is_some());
        assert!(!s.auth.change_password("ghost", "changepwd", "next").await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_falls_back_to_default_password() {
        let s = services();

        assert!(s.admin_auth.login("root", "changepwd").await.unwrap().is_none());
        let info = s.admin_auth.login("admin", "changepwd").await.unwrap().unwrap();
        assert!(info.is_admin);
        assert!(info.org_id.is_none());
        assert!(info.resources.is_empty());

        assert!(s.admin_auth.change_password("admin", "changepwd", "s3cret").await.unwrap());
        assert!(s.admin_auth.login("admin", "changepwd").await.unwrap().is_none());
        assert!(s.admin_auth.login("admin", "s3cret").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_delete_rewrites_users() {
        let s = services();
        seed(&s).await;

        s.roles.delete("clerk").await.unwrap();

        assert!(!s.roles.exist("clerk").await.unwrap());
        let alice = s.users.get("alice").await.unwrap().unwrap();
        assert_eq!(alice.roles.iter().collect::<Vec<_>>(), vec!["auditor"]);
        let bob = s.users.get("bob").await.unwrap().unwrap();
        assert!(bob.roles.is_empty());
        assert!(s.auth.login("bob", "changepwd").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_svc_delete_rewrites_roles() {
        let s = services();
        seed(&s).await;

        s.svcs.delete("orders").await.unwrap();

        assert!(s.svcs.get("orders").await.unwrap().is_none());
        let clerk = s.roles.get("clerk").await.unwrap().unwrap();
        assert!(clerk.svcs.is_empty());
        let auditor = s.roles.get("auditor").await.unwrap().unwrap();
        assert!(auditor.references_service("billing"));
    }

    #[tokio::test]
    async fn test_svc_change_id() {
        let s = services();
        seed(&s).await;

        let renamed = s.svcs.change_id("orders", "sales").await.unwrap().unwrap();
        assert_eq!(renamed.id, "sales");
        assert_eq!(renamed.resources, orders_svc().resources);
        assert!(s.svcs.get("orders").await.unwrap().is_none());
        assert!(s.svcs.change_id("missing", "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_svc_change_id_to_same_id_keeps_service() {
        let s = services();
        seed(&s).await;

        let kept = s.svcs.change_id("orders", "orders").await.unwrap().unwrap();
        assert_eq!(kept, orders_svc());
        assert_eq!(s.svcs.get("orders").await.unwrap(), Some(orders_svc()));
    }

    #[tokio::test]
    async fn test_org_tree_and_delete() {
        let s = services();
        seed(&s).await;

        let forest = s.orgs.get_tree(None).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].size(), 2);

        let branch = s.orgs.get_tree(Some("0101")).await.unwrap();
        assert_eq!(branch.len(), 1);
        assert!(branch[0].is_leaf());

        s.orgs.delete("01").await.unwrap();
        assert!(!s.orgs.exist("01").await.unwrap());
        assert!(s.orgs.exist("0101").await.unwrap());
        assert!(s.users.get("alice").await.unwrap().is_none());
        assert!(s.users.get("bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_errors() {
        let s = services();

        assert!(s.orgs.get("nope").await.unwrap().is_none());
        assert!(s.orgs.get_tree(Some("nope")).await.unwrap().is_empty());
        assert!(s.users.get_by_org_id("nope").await.unwrap().is_empty());
        s.roles.delete("nope").await.unwrap();
        s.svcs.delete("nope").await.unwrap();
        s.orgs.delete("nope").await.unwrap();
    }
}
