//! 轮转分组实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "project_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub series: i32,
    pub part: i32,
    pub student_uploadable: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_group(self) -> crate::models::groups::entities::ProjectGroup {
        use crate::models::groups::entities::ProjectGroup;
        use chrono::{DateTime, Utc};

        ProjectGroup {
            id: self.id,
            series: self.series,
            part: self.part,
            student_uploadable: self.student_uploadable,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
