use service_core::error::AppError;

use super::path_authorizer;
use super::permissions::effective_permissions;
use super::role::RoleService;
use crate::models::{AuthInfo, Operation, Resource, User};

#[derive(Clone)]
pub struct AuthorizationService {
    roles: RoleService,
}

impl AuthorizationService {
    pub fn new(roles: RoleService) -> Self {
        Self { roles }
    }

    /// Merged permission list of every role `user` holds, ordered by URI.
    /// Role ids that no longer exist are ignored.
    pub async fn user_resources(&self, user: &User) -> Result<Vec<Resource>, AppError> {
        let roles = self.roles.get_all().await?;
        let held = roles.iter().filter(|role| user.has_role(&role.id));
        Ok(effective_permissions(held).into_resources())
    }

    /// Exact-match check against the permissions embedded in the session.
    pub fn authorize(&self, info: &AuthInfo, uri: &str, op: Operation) -> bool {
        path_authorizer::authorize(&info.resources, uri, op)
    }

    pub fn filter_apis(&self, apis: &[Resource], info: &AuthInfo) -> Vec<Resource> {
        path_authorizer::filter_supported_apis(apis, &info.resources)
    }
}
