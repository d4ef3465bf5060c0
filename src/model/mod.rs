pub mod auth;
pub mod dashboard;
pub mod defect;
pub mod global_error;

pub use auth::{Claims, LoginRequest, RegisterRequest, UserResponse};
