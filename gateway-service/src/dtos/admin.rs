use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrgTreeQuery {
    /// Organization id prefix; all organizations when absent.
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub org_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeSvcIdRequest {
    #[validate(length(min = 1, max = 64, message = "New service id is required"))]
    pub new_id: String,
}
