use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdminUser, Resource, User};

/// Decoded session: who the caller is and what they may call.
///
/// Serialized as the claims of the session token, so field names follow JWT
/// conventions on the wire. Rebuilt from the token on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Subject (user ID)
    #[serde(rename = "sub")]
    pub user_id: String,
    /// Organization of the user, absent for the administrator
    #[serde(rename = "org", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(rename = "adm", default)]
    pub is_admin: bool,
    /// Effective permission list, resolved at issuance
    #[serde(rename = "res", default)]
    pub resources: Vec<Resource>,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat", default)]
    pub issued_at: i64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp", default)]
    pub expires_at: i64,
}

impl AuthInfo {
    pub fn for_user(user: &User, resources: Vec<Resource>) -> Self {
        Self {
            user_id: user.id.clone(),
            org_id: Some(user.org_id.clone()),
            is_admin: false,
            resources,
            issued_at: 0,
            expires_at: 0,
        }
    }

    pub fn admin() -> Self {
        Self {
            user_id: AdminUser::ID.to_string(),
            org_id: None,
            is_admin: true,
            resources: Vec::new(),
            issued_at: 0,
            expires_at: 0,
        }
    }

    /// Same identity and permissions with a new validity window.
    pub fn stamped(&self, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            issued_at: issued_at.timestamp(),
            expires_at: expires_at.timestamp(),
            ..self.clone()
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    /// Seconds left before expiry, zero once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now.timestamp()).max(0)
    }
}
