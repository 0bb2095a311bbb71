use futures::TryStreamExt;
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

use super::digest::PwdDigest;
use super::repository::UserRepository;
use crate::models::User;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    digest: Arc<dyn PwdDigest>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, digest: Arc<dyn PwdDigest>) -> Self {
        Self { repo, digest }
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn get_by_org_id(&self, org_id: &str) -> Result<Vec<User>, AppError> {
        self.repo.find_by_org_id(org_id).try_collect().await
    }

    pub async fn get_all(&self) -> Result<Vec<User>, AppError> {
        self.repo.find_all().try_collect().await
    }

    pub async fn exist(&self, id: &str) -> Result<bool, AppError> {
        self.repo.exists_by_id(id).await
    }

    /// Saves `user`. A user that did not exist before starts with the
    /// default password.
    pub async fn create_or_update(&self, user: User) -> Result<User, AppError> {
        user.validate()?;
        let existed = self.repo.exists_by_id(&user.id).await?;
        let saved = self.repo.save(user).await?;

        if !existed {
            self.repo
                .change_pwd(&saved.id, &self.digest.default_digest(&saved.id)?)
                .await?;
            tracing::info!(user_id = %saved.id, "User created with default password");
        } else {
            tracing::info!(user_id = %saved.id, "User updated");
        }

        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub async fn delete_by_org_id(&self, org_id: &str) -> Result<(), AppError> {
        self.repo.delete_by_org_id(org_id).await?;
        tracing::info!(org_id = %org_id, "Users of organization deleted");
        Ok(())
    }

    pub async fn get_pwd(&self, id: &str) -> Result<Option<String>, AppError> {
        self.repo.find_pwd(id).await
    }

    /// Stores an already digested password.
    pub async fn change_pwd(&self, id: &str, pwd_digest: &str) -> Result<(), AppError> {
        self.repo.change_pwd(id, pwd_digest).await
    }
}
