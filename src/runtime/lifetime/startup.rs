use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::services::{
    AdminService, AuthService, GraceScheduler, ProjectService, SlotStore, SubmissionService,
};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use actix_web::web;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub auth: web::Data<AuthService>,
    pub admin: web::Data<AdminService>,
    pub projects: web::Data<ProjectService>,
    pub submissions: web::Data<SubmissionService>,
    pub scheduler_task: JoinHandle<()>,
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 初始化研究生办公室账号
/// 如果数据库中没有任何用户，则创建一个 grad_office 角色的 admin 账号
async fn seed_admin(storage: &Arc<dyn Storage>, config: &AppConfig) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&config.argon2, &password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        username: "admin".to_string(),
        name: "Graduate Office".to_string(),
        email: "admin@localhost.localdomain".to_string(),
        password: password_hash,
        role: UserRole::GradOffice,
    };

    match storage.create_user(admin_request).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, username: {})",
                user.id, user.username
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储、宽限期调度器和各业务服务
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    // 可能已被其他组件安装
    let _ = rustls::crypto::ring::default_provider().install_default();

    let storage = crate::storage::create_storage(&config.database).await?;
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage, config).await;

    tokio::fs::create_dir_all(&config.upload.dir)
        .await
        .map_err(|e| {
            PortalError::file_operation(format!(
                "无法创建上传目录 {}: {e}",
                config.upload.dir
            ))
        })?;

    let scheduler = GraceScheduler::new(storage.clone());

    // 补触发停机期间到期的任务
    let fired = scheduler.fire_due(chrono::Utc::now()).await?;
    if !fired.is_empty() {
        warn!(
            "Closed {} grace window(s) that expired while offline",
            fired.len()
        );
    }
    let scheduler_task = scheduler
        .clone()
        .spawn(Duration::from_secs(config.scheduler.tick_interval.max(1)));
    info!(
        "Grace scheduler running every {}s, grace period {}s",
        config.scheduler.tick_interval, config.upload.grace_period
    );

    let auth = web::Data::new(AuthService::new(storage.clone(), config.jwt.clone()));
    let admin = web::Data::new(AdminService::new(
        storage.clone(),
        scheduler.clone(),
        config.argon2.clone(),
    ));
    let projects = web::Data::new(ProjectService::new(storage.clone()));
    let submissions = web::Data::new(SubmissionService::new(
        storage.clone(),
        scheduler,
        SlotStore::new(&config.upload.dir),
        config.upload.grace_period(),
        config.upload.max_filename_len,
    ));

    Ok(StartupContext {
        storage,
        auth,
        admin,
        projects,
        submissions,
        scheduler_task,
    })
}
