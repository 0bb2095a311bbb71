//! Process-local storage backend used by tests and `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::repository::{
    AdminUserRepository, EntityStream, HealthCheck, OrgRepository, RoleRepository, SvcRepository,
    UserRepository,
};
use crate::models::{AdminUser, Organization, Role, Service, User};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    pwd: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    orgs: BTreeMap<String, Organization>,
    users: BTreeMap<String, UserRecord>,
    roles: BTreeMap<String, Role>,
    svcs: BTreeMap<String, Service>,
    admin: Option<AdminUser>,
}

/// All collections behind a single lock so each call observes a consistent
/// snapshot.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("In-memory store lock poisoned: {}", e))
            })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("In-memory store lock poisoned: {}", e))
            })
    }

    /// Snapshots the selected rows so the returned stream holds no lock.
    fn snapshot<T, F>(&self, select: F) -> EntityStream<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tables) -> Vec<T>,
    {
        match self.read() {
            Ok(tables) => stream::iter(select(&*tables).into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

#[async_trait]
impl OrgRepository for InMemoryStore {
    fn find_by_id_prefix(&self, prefix: &str) -> EntityStream<Organization> {
        let prefix = prefix.to_string();
        self.snapshot(move |t| {
            t.orgs
                .range(prefix.clone()..)
                .take_while(|(id, _)| id.starts_with(&prefix))
                .map(|(_, org)| org.clone())
                .collect()
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, AppError> {
        Ok(self.read()?.orgs.get(id).cloned())
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.read()?.orgs.contains_key(id))
    }

    async fn save(&self, org: Organization) -> Result<Organization, AppError> {
        self.write()?.orgs.insert(org.id.clone(), org.clone());
        Ok(org)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.write()?.orgs.remove(id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    fn find_all(&self) -> EntityStream<User> {
        self.snapshot(|t| t.users.values().map(|r| r.user.clone()).collect())
    }

    fn find_by_org_id(&self, org_id: &str) -> EntityStream<User> {
        let org_id = org_id.to_string();
        self.snapshot(move |t| {
            t.users
                .values()
                .filter(|r| r.user.org_id == org_id)
                .map(|r| r.user.clone())
                .collect()
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(id).map(|r| r.user.clone()))
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.read()?.users.contains_key(id))
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        let mut tables = self.write()?;
        let pwd = tables.users.get(&user.id).and_then(|r| r.pwd.clone());
        tables.users.insert(
            user.id.clone(),
            UserRecord {
                user: user.clone(),
                pwd,
            },
        );
        Ok(user)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.write()?.users.remove(id);
        Ok(())
    }

    async fn delete_by_org_id(&self, org_id: &str) -> Result<(), AppError> {
        self.write()?.users.retain(|_, r| r.user.org_id != org_id);
        Ok(())
    }

    async fn find_pwd(&self, id: &str) -> Result<Option<String>, AppError> {
        Ok(self.read()?.users.get(id).and_then(|r| r.pwd.clone()))
    }

    async fn change_pwd(&self, id: &str, pwd: &str) -> Result<(), AppError> {
        let mut tables = self.write()?;
        match tables.users.get_mut(id) {
            Some(record) => {
                record.pwd = Some(pwd.to_string());
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("User {} not found", id))),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    fn find_all(&self) -> EntityStream<Role> {
        self.snapshot(|t| t.roles.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Role>, AppError> {
        Ok(self.read()?.roles.get(id).cloned())
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.read()?.roles.contains_key(id))
    }

    async fn save(&self, role: Role) -> Result<Role, AppError> {
        self.write()?.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.write()?.roles.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SvcRepository for InMemoryStore {
    fn find_all(&self) -> EntityStream<Service> {
        self.snapshot(|t| t.svcs.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        Ok(self.read()?.svcs.get(id).cloned())
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.read()?.svcs.contains_key(id))
    }

    async fn save(&self, svc: Service) -> Result<Service, AppError> {
        self.write()?.svcs.insert(svc.id.clone(), svc.clone());
        Ok(svc)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.write()?.svcs.remove(id);
        Ok(())
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryStore {
    async fn get_admin_user(&self) -> Result<Option<AdminUser>, AppError> {
        Ok(self.read()?.admin.clone())
    }

    async fn change_pwd(&self, pwd: &str) -> Result<(), AppError> {
        self.write()?.admin = Some(AdminUser::new(pwd));
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_prefix_listing_is_ordered_and_bounded() {
        let store = InMemoryStore::new();
        for id in ["b", "a02", "a", "a01", "a0101"] {
            OrgRepository::save(&store, Organization::new(id, id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .find_by_id_prefix("a0")
            .map_ok(|org| org.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec!["a01", "a0101", "a02"]);

        let all: Vec<Organization> = store.find_by_id_prefix("").try_collect().await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_user_save_keeps_password() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, User::new("u1", "o1", ["r1"])).await.unwrap();
        UserRepository::change_pwd(&store, "u1", "digest").await.unwrap();

        UserRepository::save(&store, User::new("u1", "o2", Vec::<String>::new()))
            .await
            .unwrap();

        assert_eq!(store.find_pwd("u1").await.unwrap().as_deref(), Some("digest"));
        let user = UserRepository::find_by_id(&store, "u1").await.unwrap().unwrap();
        assert_eq!(user.org_id, "o2");
    }

    #[tokio::test]
    async fn test_change_pwd_unknown_user() {
        let store = InMemoryStore::new();
        let result = UserRepository::change_pwd(&store, "ghost", "digest").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_org_id() {
        let store = InMemoryStore::new();
        for (id, org) in [("u1", "o1"), ("u2", "o1"), ("u3", "o2")] {
            UserRepository::save(&store, User::new(id, org, Vec::<String>::new()))
                .await
                .unwrap();
        }

        store.delete_by_org_id("o1").await.unwrap();

        let remaining: Vec<User> = UserRepository::find_all(&store).try_collect().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "u3");
    }
}
