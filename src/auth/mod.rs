pub mod jwt;
pub mod middleware;

pub use jwt::JwtUtils;
pub use middleware::AuthMiddleware;

use crate::entity::user::Role;

/// Authenticated identity resolved by the middleware and injected into the
/// request extensions.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub role: Role,
}
