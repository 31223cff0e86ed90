//! 宽限期任务存储操作

use super::SeaOrmStorage;
use crate::entity::grace_jobs::{ActiveModel, Column, Entity as GraceJobs};
use crate::entity::projects::{Column as ProjectColumn, Entity as Projects};
use crate::errors::{PortalError, Result};
use crate::models::{grace::entities::GraceJob, projects::entities::Project};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 登记宽限期任务，同时标记项目已提交
    pub async fn register_grace_job_impl(
        &self,
        project_id: i64,
        fire_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<GraceJob> {
        let name = GraceJob::job_name(project_id);
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = GraceJobs::find_by_id(name.clone())
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询宽限期任务失败: {e}")))?;
        if existing.is_some() {
            return Err(PortalError::duplicate_job(name));
        }

        let model = ActiveModel {
            name: Set(name.clone()),
            project_id: Set(project_id),
            fire_at: Set(fire_at.timestamp()),
            created_at: Set(now),
        };

        let job = model.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => PortalError::duplicate_job(name.clone()),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                PortalError::not_found(format!("Project {project_id} not found"))
            }
            _ => PortalError::database_operation(format!("登记宽限期任务失败: {e}")),
        })?;

        let updated = Projects::update_many()
            .col_expr(ProjectColumn::Uploaded, Expr::value(true))
            .col_expr(ProjectColumn::GracePassed, Expr::value(false))
            .col_expr(ProjectColumn::UpdatedAt, Expr::value(now))
            .filter(ProjectColumn::Id.eq(project_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新项目状态失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(PortalError::not_found(format!(
                "Project {project_id} not found"
            )));
        }

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(job.into_grace_job())
    }

    /// 查询项目的宽限期任务
    pub async fn get_grace_job_impl(&self, project_id: i64) -> Result<Option<GraceJob>> {
        let result = GraceJobs::find_by_id(GraceJob::job_name(project_id))
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询宽限期任务失败: {e}")))?;

        Ok(result.map(|m| m.into_grace_job()))
    }

    /// 删除宽限期任务
    pub async fn delete_grace_job_impl(&self, project_id: i64) -> Result<bool> {
        let result = GraceJobs::delete_by_id(GraceJob::job_name(project_id))
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除宽限期任务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 列出到期任务
    pub async fn list_due_grace_jobs_impl(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<GraceJob>> {
        let result = GraceJobs::find()
            .filter(Column::FireAt.lte(now.timestamp()))
            .order_by_asc(Column::FireAt)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询到期任务失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_grace_job()).collect())
    }

    /// 触发任务：删除任务并关闭项目的提交窗口
    pub async fn fire_grace_job_impl(&self, project_id: i64) -> Result<Option<Project>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        let deleted = GraceJobs::delete_by_id(GraceJob::job_name(project_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除宽限期任务失败: {e}")))?;

        // 已被触发或取消
        if deleted.rows_affected == 0 {
            return Ok(None);
        }

        Projects::update_many()
            .col_expr(ProjectColumn::GracePassed, Expr::value(true))
            .col_expr(
                ProjectColumn::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(ProjectColumn::Id.eq(project_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新项目状态失败: {e}")))?;

        let project = Projects::find_by_id(project_id)
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询项目失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(project.map(|m| m.into_project()))
    }

    /// 手动关闭提交窗口，不要求存在待触发任务
    pub async fn close_grace_window_impl(&self, project_id: i64) -> Result<Option<Project>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        GraceJobs::delete_by_id(GraceJob::job_name(project_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除宽限期任务失败: {e}")))?;

        let updated = Projects::update_many()
            .col_expr(ProjectColumn::GracePassed, Expr::value(true))
            .col_expr(
                ProjectColumn::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(ProjectColumn::Id.eq(project_id))
            .filter(ProjectColumn::Uploaded.eq(true))
            .filter(ProjectColumn::GracePassed.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新项目状态失败: {e}")))?;

        // 未提交或已关闭；事务丢弃时回滚
        if updated.rows_affected == 0 {
            return Ok(None);
        }

        let project = Projects::find_by_id(project_id)
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询项目失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(project.map(|m| m.into_project()))
    }
}
