use futures::TryStreamExt;
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

use super::org_tree::build_forest;
use super::repository::OrgRepository;
use super::user::UserService;
use crate::models::{OrgTree, Organization};

#[derive(Clone)]
pub struct OrgService {
    repo: Arc<dyn OrgRepository>,
    users: UserService,
}

impl OrgService {
    pub fn new(repo: Arc<dyn OrgRepository>, users: UserService) -> Self {
        Self { repo, users }
    }

    /// Forest of every organization whose id starts with `prefix`.
    pub async fn get_tree(&self, prefix: Option<&str>) -> Result<Vec<OrgTree>, AppError> {
        let orgs: Vec<Organization> = self
            .repo
            .find_by_id_prefix(prefix.unwrap_or(""))
            .try_collect()
            .await?;
        Ok(build_forest(orgs))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Organization>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn exist(&self, id: &str) -> Result<bool, AppError> {
        self.repo.exists_by_id(id).await
    }

    pub async fn create_or_update(&self, org: Organization) -> Result<Organization, AppError> {
        org.validate()?;
        let saved = self.repo.save(org).await?;
        tracing::info!(org_id = %saved.id, "Organization saved");
        Ok(saved)
    }

    /// Removes the organization's users, then the organization itself.
    /// Descendant organizations are left in place.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.users.delete_by_org_id(id).await?;
        self.repo.delete_by_id(id).await?;
        tracing::info!(org_id = %id, "Organization deleted");
        Ok(())
    }
}
