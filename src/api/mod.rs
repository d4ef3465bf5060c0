mod auth;
#[path = "dashboard.rs"]
mod dashboard_routes;
mod defects;
#[path = "health_check.rs"]
mod health_check_routes;

pub use crate::api::auth::{get_me, login, logout, refresh_token, register};
pub use crate::api::dashboard_routes::{dashboard, reports};
pub use crate::api::defects::{
    add_comment, assign_defect, create_defect, get_defect, list_defects, update_status,
    users_for_assignment,
};
pub use crate::api::health_check_routes::health_check;
