pub mod auth;
pub mod common;
pub mod grace;
pub mod groups;
pub mod projects;
pub mod users;

pub use common::{ApiResponse, AppStartTime, ErrorCode};
