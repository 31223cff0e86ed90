pub mod admin;
pub mod auth;
pub mod grace;
pub mod projects;
pub mod submissions;

pub use admin::AdminService;
pub use auth::AuthService;
pub use grace::GraceScheduler;
pub use projects::ProjectService;
pub use submissions::{SlotStore, SubmissionService};
