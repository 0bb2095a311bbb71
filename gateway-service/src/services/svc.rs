use futures::TryStreamExt;
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

use super::repository::SvcRepository;
use super::role::RoleService;
use crate::models::Service;

#[derive(Clone)]
pub struct SvcService {
    repo: Arc<dyn SvcRepository>,
    roles: RoleService,
}

impl SvcService {
    pub fn new(repo: Arc<dyn SvcRepository>, roles: RoleService) -> Self {
        Self { repo, roles }
    }

    pub async fn get_all(&self) -> Result<Vec<Service>, AppError> {
        self.repo.find_all().try_collect().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Service>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn exist(&self, id: &str) -> Result<bool, AppError> {
        self.repo.exists_by_id(id).await
    }

    pub async fn create_or_update(&self, svc: Service) -> Result<Service, AppError> {
        svc.validate()?;
        let saved = self.repo.save(svc).await?;
        tracing::info!(svc_id = %saved.id, "Service saved");
        Ok(saved)
    }

    /// Copies the service under `new_id` and removes the old record.
    /// Returns `None` when `old_id` does not exist.
    ///
    /// Roles keep pointing at their own embedded copy of the service.
    /// Renaming a service to its current id leaves it untouched.
    pub async fn change_id(&self, old_id: &str, new_id: &str) -> Result<Option<Service>, AppError> {
        let Some(svc) = self.repo.find_by_id(old_id).await? else {
            return Ok(None);
        };
        if old_id == new_id {
            return Ok(Some(svc));
        }

        let renamed = Service {
            id: new_id.to_string(),
            ..svc
        };
        renamed.validate()?;

        let saved = self.repo.save(renamed).await?;
        self.repo.delete_by_id(old_id).await?;
        tracing::info!(old_id = %old_id, new_id = %new_id, "Service id changed");
        Ok(Some(saved))
    }

    /// Removes the service from every role referencing it, then deletes it.
    /// Best effort, like role deletion.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        for role in self.roles.get_all().await? {
            if role.references_service(id) {
                self.roles.create_or_update(role.without_service(id)).await?;
            }
        }

        self.repo.delete_by_id(id).await?;
        tracing::info!(svc_id = %id, "Service deleted");
        Ok(())
    }
}
