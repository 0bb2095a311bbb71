use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Gateway user. Passwords live next to the user record in the store but
/// are never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct User {
    #[validate(length(min = 1, max = 64, message = "User id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Organization id is required"))]
    pub org_id: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        org_id: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            org_id: org_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.contains(role_id)
    }

    /// Copy of this user without `role_id`.
    pub fn without_role(&self, role_id: &str) -> Self {
        let mut user = self.clone();
        user.roles.remove(role_id);
        user
    }
}

/// The single administrator account, stored separately from users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub pwd: String,
}

impl AdminUser {
    pub const ID: &'static str = "admin";

    pub fn new(pwd: impl Into<String>) -> Self {
        Self {
            id: Self::ID.to_string(),
            pwd: pwd.into(),
        }
    }
}
