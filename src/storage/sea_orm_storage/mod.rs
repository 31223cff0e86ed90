//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod grace_jobs;
mod groups;
mod projects;
mod users;

use crate::config::DatabaseConfig;
use crate::errors::{PortalError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 连接数据库并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| PortalError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PortalError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存数据库不支持 WAL
        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("wal_autocheckpoint", "1000");
        }

        // 每个内存数据库连接都是独立的库，只能使用单连接
        let max_connections = if in_memory { 1 } else { config.pool_size };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PortalError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    grace::entities::GraceJob,
    groups::{entities::ProjectGroup, requests::CreateGroupRequest},
    projects::{entities::Project, requests::CreateProjectRequest},
    users::{entities::User, requests::CreateUserRequest},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 分组模块
    async fn create_group(&self, group: CreateGroupRequest) -> Result<ProjectGroup> {
        self.create_group_impl(group).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<ProjectGroup>> {
        self.get_group_by_id_impl(group_id).await
    }

    async fn get_most_recent_group(&self) -> Result<Option<ProjectGroup>> {
        self.get_most_recent_group_impl().await
    }

    // 项目模块
    async fn create_project(&self, project: CreateProjectRequest) -> Result<Project> {
        self.create_project_impl(project).await
    }

    async fn get_project_by_id(&self, project_id: i64) -> Result<Option<Project>> {
        self.get_project_by_id_impl(project_id).await
    }

    async fn get_student_project_in_group(
        &self,
        group_id: i64,
        student_id: i64,
    ) -> Result<Option<Project>> {
        self.get_student_project_in_group_impl(group_id, student_id)
            .await
    }

    async fn list_projects_by_student(&self, student_id: i64) -> Result<Vec<Project>> {
        self.list_projects_by_student_impl(student_id).await
    }

    async fn list_projects_by_supervisor(&self, supervisor_id: i64) -> Result<Vec<Project>> {
        self.list_projects_by_supervisor_impl(supervisor_id).await
    }

    async fn list_projects_by_cogs_marker(&self, cogs_marker_id: i64) -> Result<Vec<Project>> {
        self.list_projects_by_cogs_marker_impl(cogs_marker_id).await
    }

    async fn set_submission_extension(
        &self,
        project_id: i64,
        extension: Option<&str>,
    ) -> Result<()> {
        self.set_submission_extension_impl(project_id, extension)
            .await
    }

    // 宽限期任务模块
    async fn register_grace_job(
        &self,
        project_id: i64,
        fire_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<GraceJob> {
        self.register_grace_job_impl(project_id, fire_at).await
    }

    async fn get_grace_job(&self, project_id: i64) -> Result<Option<GraceJob>> {
        self.get_grace_job_impl(project_id).await
    }

    async fn delete_grace_job(&self, project_id: i64) -> Result<bool> {
        self.delete_grace_job_impl(project_id).await
    }

    async fn list_due_grace_jobs(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<GraceJob>> {
        self.list_due_grace_jobs_impl(now).await
    }

    async fn fire_grace_job(&self, project_id: i64) -> Result<Option<Project>> {
        self.fire_grace_job_impl(project_id).await
    }

    async fn close_grace_window(&self, project_id: i64) -> Result<Option<Project>> {
        self.close_grace_window_impl(project_id).await
    }
}

/// 测试用内存数据库
#[cfg(test)]
pub(crate) async fn memory_storage() -> std::sync::Arc<dyn Storage> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        pool_size: 1,
        timeout: 5,
    };
    std::sync::Arc::new(
        SeaOrmStorage::connect(&config)
            .await
            .expect("in-memory sqlite should connect"),
    )
}
