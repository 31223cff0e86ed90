//! 分组存储操作

use super::SeaOrmStorage;
use crate::entity::project_groups::{ActiveModel, Column, Entity as ProjectGroups};
use crate::errors::{PortalError, Result};
use crate::models::groups::{entities::ProjectGroup, requests::CreateGroupRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, SqlErr};

impl SeaOrmStorage {
    /// 创建分组
    pub async fn create_group_impl(&self, req: CreateGroupRequest) -> Result<ProjectGroup> {
        let model = ActiveModel {
            series: Set(req.series),
            part: Set(req.part),
            student_uploadable: Set(req.student_uploadable.unwrap_or(true)),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => PortalError::conflict(format!(
                "Group {}_{} already exists",
                req.series, req.part
            )),
            _ => PortalError::database_operation(format!("创建分组失败: {e}")),
        })?;

        Ok(result.into_group())
    }

    /// 通过 ID 获取分组
    pub async fn get_group_by_id_impl(&self, group_id: i64) -> Result<Option<ProjectGroup>> {
        let result = ProjectGroups::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询分组失败: {e}")))?;

        Ok(result.map(|m| m.into_group()))
    }

    /// 获取最新分组
    pub async fn get_most_recent_group_impl(&self) -> Result<Option<ProjectGroup>> {
        let result = ProjectGroups::find()
            .order_by_desc(Column::Series)
            .order_by_desc(Column::Part)
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询最新分组失败: {e}")))?;

        Ok(result.map(|m| m.into_group()))
    }
}
