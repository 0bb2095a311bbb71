pub mod admin_auth;
pub mod auth;
pub mod health;
pub mod org;
pub mod pages;
pub mod role;
pub mod svc;
pub mod user;
