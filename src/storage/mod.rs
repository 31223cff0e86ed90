use std::sync::Arc;

use crate::models::{
    grace::entities::GraceJob,
    groups::{entities::ProjectGroup, requests::CreateGroupRequest},
    projects::{entities::Project, requests::CreateProjectRequest},
    users::{entities::User, requests::CreateUserRequest},
};

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段须已哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 用户总数
    async fn count_users(&self) -> Result<u64>;

    /// 分组管理方法
    // 创建分组
    async fn create_group(&self, group: CreateGroupRequest) -> Result<ProjectGroup>;
    // 通过ID获取分组
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<ProjectGroup>>;
    // 获取最新的分组（series、part 最大者）
    async fn get_most_recent_group(&self) -> Result<Option<ProjectGroup>>;

    /// 项目管理方法
    // 创建项目
    async fn create_project(&self, project: CreateProjectRequest) -> Result<Project>;
    // 通过ID获取项目
    async fn get_project_by_id(&self, project_id: i64) -> Result<Option<Project>>;
    // 获取学生在分组中的项目
    async fn get_student_project_in_group(
        &self,
        group_id: i64,
        student_id: i64,
    ) -> Result<Option<Project>>;
    // 学生、导师、COGS 评阅人各自参与的项目，按分组从新到旧排列
    async fn list_projects_by_student(&self, student_id: i64) -> Result<Vec<Project>>;
    async fn list_projects_by_supervisor(&self, supervisor_id: i64) -> Result<Vec<Project>>;
    async fn list_projects_by_cogs_marker(&self, cogs_marker_id: i64) -> Result<Vec<Project>>;
    // 记录当前存储文件的扩展名；None 表示尚无文件
    async fn set_submission_extension(
        &self,
        project_id: i64,
        extension: Option<&str>,
    ) -> Result<()>;

    /// 宽限期任务方法
    // 在同一事务中登记任务并将项目标记为已提交；任务已存在时返回 DuplicateJob
    async fn register_grace_job(
        &self,
        project_id: i64,
        fire_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<GraceJob>;
    // 查询项目的待触发任务
    async fn get_grace_job(&self, project_id: i64) -> Result<Option<GraceJob>>;
    // 删除待触发任务，不修改项目
    async fn delete_grace_job(&self, project_id: i64) -> Result<bool>;
    // 列出到期任务
    async fn list_due_grace_jobs(&self, now: chrono::DateTime<chrono::Utc>)
    -> Result<Vec<GraceJob>>;
    // 在同一事务中删除任务并设置 grace_passed；任务不存在时返回 None
    async fn fire_grace_job(&self, project_id: i64) -> Result<Option<Project>>;
    // 在同一事务中删除可能存在的任务并关闭已提交项目的窗口；
    // 项目未提交或窗口已关闭时返回 None
    async fn close_grace_window(&self, project_id: i64) -> Result<Option<Project>>;
}

pub async fn create_storage(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::connect(config).await?;
    Ok(Arc::new(storage))
}
