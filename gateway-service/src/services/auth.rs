use service_core::error::AppError;
use std::sync::Arc;

use super::authorization::AuthorizationService;
use super::digest::PwdDigest;
use super::repository::AdminUserRepository;
use super::user::UserService;
use crate::models::{AdminUser, AuthInfo};

/// Password login for ordinary users.
#[derive(Clone)]
pub struct AuthenticationService {
    users: UserService,
    authz: AuthorizationService,
    digest: Arc<dyn PwdDigest>,
}

impl AuthenticationService {
    pub fn new(
        users: UserService,
        authz: AuthorizationService,
        digest: Arc<dyn PwdDigest>,
    ) -> Self {
        Self {
            users,
            authz,
            digest,
        }
    }

    /// Session claims for valid credentials, `None` otherwise.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthInfo>, AppError> {
        let Some(stored) = self.users.get_pwd(username).await? else {
            tracing::info!(user_id = %username, "Login rejected: unknown user");
            return Ok(None);
        };

        if !self.digest.matches(username, password, &stored) {
            tracing::info!(user_id = %username, "Login rejected: wrong password");
            return Ok(None);
        }

        let Some(user) = self.users.get(username).await? else {
            return Ok(None);
        };

        let resources = self.authz.user_resources(&user).await?;
        tracing::info!(
            user_id = %user.id,
            org_id = %user.org_id,
            resource_count = resources.len(),
            "User logged in"
        );
        Ok(Some(AuthInfo::for_user(&user, resources)))
    }

    /// Replaces the password when `old_password` is correct.
    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<bool, AppError> {
        let Some(stored) = self.users.get_pwd(username).await? else {
            return Ok(false);
        };

        if !self.digest.matches(username, old_password, &stored) {
            tracing::info!(user_id = %username, "Password change rejected");
            return Ok(false);
        }

        self.users
            .change_pwd(username, &self.digest.digest(username, new_password)?)
            .await?;
        tracing::info!(user_id = %username, "Password changed");
        Ok(true)
    }
}

/// Login for the single administrator identity.
///
/// Until the admin changes its password the configured default applies.
#[derive(Clone)]
pub struct AdminAuthService {
    repo: Arc<dyn AdminUserRepository>,
    digest: Arc<dyn PwdDigest>,
}

impl AdminAuthService {
    pub fn new(repo: Arc<dyn AdminUserRepository>, digest: Arc<dyn PwdDigest>) -> Self {
        Self { repo, digest }
    }

    async fn stored_digest(&self) -> Result<String, AppError> {
        Ok(match self.repo.get_admin_user().await? {
            Some(admin) => admin.pwd,
            None => self.digest.default_digest(AdminUser::ID)?,
        })
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthInfo>, AppError> {
        if username != AdminUser::ID {
            tracing::info!(user_id = %username, "Admin login rejected: not the admin identity");
            return Ok(None);
        }

        let stored = self.stored_digest().await?;
        if !self.digest.matches(AdminUser::ID, password, &stored) {
            tracing::info!("Admin login rejected: wrong password");
            return Ok(None);
        }

        tracing::info!("Admin logged in");
        Ok(Some(AuthInfo::admin()))
    }

    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<bool, AppError> {
        if username != AdminUser::ID {
            return Ok(false);
        }

        let stored = self.stored_digest().await?;
        if !self.digest.matches(AdminUser::ID, old_password, &stored) {
            tracing::info!("Admin password change rejected");
            return Ok(false);
        }

        self.repo
            .change_pwd(&self.digest.digest(AdminUser::ID, new_password)?)
            .await?;
        tracing::info!("Admin password changed");
        Ok(true)
    }
}
