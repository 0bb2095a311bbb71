use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Operation;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePwdRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_pwd: String,
    #[validate(length(min = 1, max = 128, message = "New password must be 1-128 characters"))]
    pub new_pwd: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePwdResponse {
    pub changed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub uri: String,
    pub op: Operation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
}
