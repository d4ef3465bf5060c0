pub mod user;
pub mod defect;
pub mod assignment;
pub mod comment;
pub mod photo;
