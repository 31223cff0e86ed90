//! 项目存储操作

use super::SeaOrmStorage;
use crate::entity::projects::{ActiveModel, Column, Entity as Projects};
use crate::errors::{PortalError, Result};
use crate::models::projects::{entities::Project, requests::CreateProjectRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建项目
    pub async fn create_project_impl(&self, req: CreateProjectRequest) -> Result<Project> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            title: Set(req.title),
            group_id: Set(req.group_id),
            student_id: Set(req.student_id),
            cogs_marker_id: Set(req.cogs_marker_id),
            supervisor_id: Set(req.supervisor_id),
            uploaded: Set(false),
            grace_passed: Set(false),
            submission_extension: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建项目失败: {e}")))?;

        Ok(result.into_project())
    }

    /// 通过 ID 获取项目
    pub async fn get_project_by_id_impl(&self, project_id: i64) -> Result<Option<Project>> {
        let result = Projects::find_by_id(project_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询项目失败: {e}")))?;

        Ok(result.map(|m| m.into_project()))
    }

    /// 获取学生在分组中的项目
    pub async fn get_student_project_in_group_impl(
        &self,
        group_id: i64,
        student_id: i64,
    ) -> Result<Option<Project>> {
        let result = Projects::find()
            .filter(Column::GroupId.eq(group_id))
            .filter(Column::StudentId.eq(student_id))
            .order_by_asc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询学生项目失败: {e}")))?;

        Ok(result.map(|m| m.into_project()))
    }

    async fn list_projects_where(&self, column: Column, user_id: i64) -> Result<Vec<Project>> {
        let result = Projects::find()
            .filter(column.eq(user_id))
            .order_by_desc(Column::GroupId)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询项目列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_project()).collect())
    }

    /// 学生参与的项目
    pub async fn list_projects_by_student_impl(&self, student_id: i64) -> Result<Vec<Project>> {
        self.list_projects_where(Column::StudentId, student_id)
            .await
    }

    /// 导师指导的项目
    pub async fn list_projects_by_supervisor_impl(
        &self,
        supervisor_id: i64,
    ) -> Result<Vec<Project>> {
        self.list_projects_where(Column::SupervisorId, supervisor_id)
            .await
    }

    /// COGS 评阅人负责的项目
    pub async fn list_projects_by_cogs_marker_impl(
        &self,
        cogs_marker_id: i64,
    ) -> Result<Vec<Project>> {
        self.list_projects_where(Column::CogsMarkerId, cogs_marker_id)
            .await
    }

    /// 记录存储文件扩展名
    pub async fn set_submission_extension_impl(
        &self,
        project_id: i64,
        extension: Option<&str>,
    ) -> Result<()> {
        let result = Projects::update_many()
            .col_expr(
                Column::SubmissionExtension,
                Expr::value(extension.map(str::to_string)),
            )
            .col_expr(
                Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(project_id))
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新项目失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(PortalError::not_found(format!(
                "Project {project_id} not found"
            )));
        }
        Ok(())
    }
}
