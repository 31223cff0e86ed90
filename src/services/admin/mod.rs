pub mod grace;
pub mod groups;
pub mod projects;
pub mod users;

use actix_web::{HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::Argon2Config;
use crate::models::groups::requests::CreateGroupRequest;
use crate::models::projects::requests::CreateProjectRequest;
use crate::models::users::requests::CreateUserRequest;
use crate::services::GraceScheduler;
use crate::storage::Storage;

/// 研究生办公室的管理操作：账号、分组、项目和宽限期
pub struct AdminService {
    storage: Arc<dyn Storage>,
    scheduler: GraceScheduler,
    argon2: Argon2Config,
}

impl AdminService {
    pub fn new(storage: Arc<dyn Storage>, scheduler: GraceScheduler, argon2: Argon2Config) -> Self {
        Self {
            storage,
            scheduler,
            argon2,
        }
    }

    // 创建用户
    pub async fn create_user(&self, user_data: CreateUserRequest) -> ActixResult<HttpResponse> {
        users::handle_create_user(self, user_data).await
    }

    // 创建分组
    pub async fn create_group(&self, group_data: CreateGroupRequest) -> ActixResult<HttpResponse> {
        groups::handle_create_group(self, group_data).await
    }

    // 创建项目
    pub async fn create_project(
        &self,
        project_data: CreateProjectRequest,
    ) -> ActixResult<HttpResponse> {
        projects::handle_create_project(self, project_data).await
    }

    // 立即关闭项目的宽限期
    pub async fn close_grace(&self, project_id: i64) -> ActixResult<HttpResponse> {
        grace::handle_close_grace(self, project_id).await
    }

    // 取消项目的宽限期任务
    pub async fn cancel_grace(&self, project_id: i64) -> ActixResult<HttpResponse> {
        grace::handle_cancel_grace(self, project_id).await
    }
}

#[cfg(test)]
pub(crate) async fn test_service() -> AdminService {
    let storage = crate::storage::sea_orm_storage::memory_storage().await;
    AdminService::new(
        storage.clone(),
        GraceScheduler::new(storage),
        crate::utils::password::test_argon2_config(),
    )
}
