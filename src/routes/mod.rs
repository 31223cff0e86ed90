pub mod admin;

pub mod auth;

pub mod projects;

pub mod submissions;

pub use admin::configure_admin_routes;
pub use auth::configure_auth_routes;
pub use projects::configure_project_routes;
pub use submissions::configure_submission_routes;
