use serde::Serialize;
use ts_rs::TS;

use super::entities::User;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserResponse {
    pub user: User,
}
