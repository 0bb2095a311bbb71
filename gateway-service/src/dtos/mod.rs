pub mod admin;
pub mod auth;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistResponse {
    pub exist: bool,
}

/// Returned by login and refresh endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub expires_in: i64,
}
