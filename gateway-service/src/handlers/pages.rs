//! Minimal server-rendered pages for the browser flow.

use askama::Template;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub redirect: Option<String>,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user_id: String,
    pub org_id: String,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {}
