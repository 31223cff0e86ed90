use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建轮转分组表
        manager
            .create_table(
                Table::create()
                    .table(ProjectGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectGroups::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectGroups::Series).integer().not_null())
                    .col(ColumnDef::new(ProjectGroups::Part).integer().not_null())
                    .col(
                        ColumnDef::new(ProjectGroups::StudentUploadable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ProjectGroups::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一轮次只允许一个分组
        manager
            .create_index(
                Index::create()
                    .name("idx_project_groups_series_part")
                    .table(ProjectGroups::Table)
                    .col(ProjectGroups::Series)
                    .col(ProjectGroups::Part)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建项目表
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Title).string().not_null())
                    .col(ColumnDef::new(Projects::GroupId).big_integer().not_null())
                    .col(ColumnDef::new(Projects::StudentId).big_integer().null())
                    .col(ColumnDef::new(Projects::CogsMarkerId).big_integer().null())
                    .col(ColumnDef::new(Projects::SupervisorId).big_integer().null())
                    .col(
                        ColumnDef::new(Projects::Uploaded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::GracePassed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::SubmissionExtension)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Projects::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::GroupId)
                            .to(ProjectGroups::Table, ProjectGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::CogsMarkerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Projects::Table, Projects::SupervisorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_group_student")
                    .table(Projects::Table)
                    .col(Projects::GroupId)
                    .col(Projects::StudentId)
                    .to_owned(),
            )
            .await?;

        // 创建宽限期任务表，任务名即主键
        manager
            .create_table(
                Table::create()
                    .table(GraceJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GraceJobs::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GraceJobs::ProjectId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GraceJobs::FireAt).big_integer().not_null())
                    .col(ColumnDef::new(GraceJobs::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(GraceJobs::Table, GraceJobs::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grace_jobs_fire_at")
                    .table(GraceJobs::Table)
                    .col(GraceJobs::FireAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GraceJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Name,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectGroups {
    #[sea_orm(iden = "project_groups")]
    Table,
    Id,
    Series,
    Part,
    StudentUploadable,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
    Title,
    GroupId,
    StudentId,
    CogsMarkerId,
    SupervisorId,
    Uploaded,
    GracePassed,
    SubmissionExtension,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GraceJobs {
    #[sea_orm(iden = "grace_jobs")]
    Table,
    Name,
    ProjectId,
    FireAt,
    CreatedAt,
}
