//! The request pipeline, outermost first: whitelist, session, then the
//! route-scoped API authorization check.

pub mod api_auth;
pub mod session;
pub mod whitelist;

pub use api_auth::{admin_api_auth_middleware, user_api_auth_middleware, AuthUser};
pub use session::{session_attach_middleware, session_redirect_middleware};
pub use whitelist::{whitelist_middleware, Whitelisted};
