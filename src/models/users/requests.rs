use serde::Deserialize;
use ts_rs::TS;

use super::entities::UserRole;

// 创建用户请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreateUserRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}
