use futures::TryStreamExt;
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

use super::repository::RoleRepository;
use super::user::UserService;
use crate::models::Role;

#[derive(Clone)]
pub struct RoleService {
    repo: Arc<dyn RoleRepository>,
    users: UserService,
}

impl RoleService {
    pub fn new(repo: Arc<dyn RoleRepository>, users: UserService) -> Self {
        Self { repo, users }
    }

    pub async fn get_all(&self) -> Result<Vec<Role>, AppError> {
        self.repo.find_all().try_collect().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Role>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn exist(&self, id: &str) -> Result<bool, AppError> {
        self.repo.exists_by_id(id).await
    }

    pub async fn create_or_update(&self, role: Role) -> Result<Role, AppError> {
        role.validate()?;
        let saved = self.repo.save(role).await?;
        tracing::info!(role_id = %saved.id, "Role saved");
        Ok(saved)
    }

    /// Strips the role from every user holding it, then deletes it.
    ///
    /// Not atomic: a failure part way leaves some users still referencing
    /// the role. Calling again finishes the job.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let holders: Vec<_> = self
            .users
            .get_all()
            .await?
            .into_iter()
            .filter(|user| user.has_role(id))
            .collect();

        for user in holders {
            self.users.create_or_update(user.without_role(id)).await?;
        }

        self.repo.delete_by_id(id).await?;
        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }
}
