//! Domain entities shared by the authorization core, the repositories and the
//! HTTP layer.

pub mod auth_info;
pub mod org;
pub mod role;
pub mod user;

pub use auth_info::AuthInfo;
pub use org::{OrgTree, Organization};
pub use role::{Operation, Resource, Role, Service};
pub use user::{AdminUser, User};
