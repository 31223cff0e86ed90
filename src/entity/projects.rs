//! 项目实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub group_id: i64,
    pub student_id: Option<i64>,
    pub cogs_marker_id: Option<i64>,
    pub supervisor_id: Option<i64>,
    pub uploaded: bool,
    pub grace_passed: bool,
    pub submission_extension: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_groups::Entity",
        from = "Column::GroupId",
        to = "super::project_groups::Column::Id"
    )]
    Group,
    #[sea_orm(has_one = "super::grace_jobs::Entity")]
    GraceJob,
}

impl Related<super::project_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::grace_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GraceJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_project(self) -> crate::models::projects::entities::Project {
        use crate::models::projects::entities::Project;
        use chrono::{DateTime, Utc};

        Project {
            id: self.id,
            title: self.title,
            group_id: self.group_id,
            student_id: self.student_id,
            cogs_marker_id: self.cogs_marker_id,
            supervisor_id: self.supervisor_id,
            uploaded: self.uploaded,
            grace_passed: self.grace_passed,
            submission_extension: self.submission_extension,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
