pub mod error_response;
pub mod extension;
pub mod jwt;
pub mod password;
pub mod validate;

pub use error_response::{json_error_handler, path_error_handler, portal_error_response};
pub use extension::submission_extension;
