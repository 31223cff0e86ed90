//! 宽限期调度器
//!
//! 首次提交时登记一个一次性的截止任务，到期后将项目标记为 `grace_passed`。
//! 任务持久化在 `grace_jobs` 表中，服务重启后由启动时的首次扫描补触发。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::errors::{PortalError, Result};
use crate::models::grace::entities::GraceJob;
use crate::models::projects::entities::Project;
use crate::storage::Storage;

#[derive(Clone)]
pub struct GraceScheduler {
    storage: Arc<dyn Storage>,
}

impl GraceScheduler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 登记截止任务，同时将项目标记为已提交
    ///
    /// 同名任务已存在时返回 `DuplicateJob`，不做任何修改。
    pub async fn register(&self, project_id: i64, fire_at: DateTime<Utc>) -> Result<GraceJob> {
        match self.storage.register_grace_job(project_id, fire_at).await {
            Ok(job) => {
                info!(
                    "Scheduled {} for project {} at {}",
                    job.name, project_id, job.fire_at
                );
                Ok(job)
            }
            Err(e @ PortalError::DuplicateJob(_)) => {
                error!("Refusing to schedule a second grace job: {}", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// 查询项目的截止时间；没有待触发任务时返回 None
    pub async fn lookup(&self, project_id: i64) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .storage
            .get_grace_job(project_id)
            .await?
            .map(|job| job.fire_at))
    }

    /// 取消待触发任务，项目标志保持不变
    pub async fn cancel(&self, project_id: i64) -> Result<bool> {
        let removed = self.storage.delete_grace_job(project_id).await?;
        if removed {
            info!("Cancelled {}", GraceJob::job_name(project_id));
        }
        Ok(removed)
    }

    /// 立即关闭已提交项目的窗口，待触发任务一并删除
    ///
    /// 任务已被取消的项目同样可以关闭；项目尚未提交或窗口已关闭时返回 None。
    pub async fn close_now(&self, project_id: i64) -> Result<Option<Project>> {
        let project = self.storage.close_grace_window(project_id).await?;
        if project.is_some() {
            info!("Grace window closed for project {}", project_id);
        }
        Ok(project)
    }

    /// 触发所有到期任务，返回已关闭的项目 ID
    ///
    /// 单个任务失败不会阻止其余任务，失败的任务留待下一次扫描。
    pub async fn fire_due(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        let due = self.storage.list_due_grace_jobs(now).await?;
        let mut fired = Vec::with_capacity(due.len());

        for job in due {
            match self.storage.fire_grace_job(job.project_id).await {
                Ok(Some(_)) => {
                    info!(
                        "{} fired (due {}), project {} closed",
                        job.name, job.fire_at, job.project_id
                    );
                    fired.push(job.project_id);
                }
                // 已被手动关闭或取消
                Ok(None) => debug!("{} already gone", job.name),
                Err(e) => warn!("Failed to fire {}: {}", job.name, e),
            }
        }

        Ok(fired)
    }

    /// 启动后台扫描循环，第一次扫描立即执行
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.fire_due(Utc::now()).await {
                    warn!("Grace scheduler tick failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::groups::requests::CreateGroupRequest;
    use crate::models::projects::requests::CreateProjectRequest;
    use crate::storage::sea_orm_storage::memory_storage;

    async fn setup() -> (Arc<dyn Storage>, GraceScheduler, i64) {
        let storage = memory_storage().await;
        let group = storage
            .create_group(CreateGroupRequest {
                series: 3,
                part: 1,
                student_uploadable: None,
            })
            .await
            .unwrap();
        let project = storage
            .create_project(CreateProjectRequest {
                title: "Protein folding".to_string(),
                group_id: group.id,
                student_id: None,
                cogs_marker_id: None,
                supervisor_id: None,
            })
            .await
            .unwrap();
        let scheduler = GraceScheduler::new(storage.clone());
        (storage, scheduler, project.id)
    }

    #[tokio::test]
    async fn test_register_marks_project_uploaded() {
        let (storage, scheduler, pid) = setup().await;
        let fire_at = Utc::now() + chrono::Duration::days(7);

        let job = scheduler.register(pid, fire_at).await.unwrap();
        assert_eq!(job.name, "grace_deadline_".to_string() + &pid.to_string());

        let project = storage.get_project_by_id(pid).await.unwrap().unwrap();
        assert!(project.uploaded);
        assert!(!project.grace_passed);
        assert_eq!(
            scheduler.lookup(pid).await.unwrap().map(|t| t.timestamp()),
            Some(fire_at.timestamp())
        );
    }

    #[tokio::test]
    async fn test_second_register_is_duplicate() {
        let (_storage, scheduler, pid) = setup().await;
        let fire_at = Utc::now() + chrono::Duration::days(7);
        scheduler.register(pid, fire_at).await.unwrap();

        let err = scheduler
            .register(pid, fire_at + chrono::Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::DuplicateJob(_)));
        // 原截止时间不变
        assert_eq!(
            scheduler.lookup(pid).await.unwrap().map(|t| t.timestamp()),
            Some(fire_at.timestamp())
        );
    }

    #[tokio::test]
    async fn test_register_unknown_project() {
        let (_storage, scheduler, _pid) = setup().await;
        let err = scheduler.register(9999, Utc::now()).await.unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fire_due_only_fires_expired_jobs() {
        let (storage, scheduler, pid) = setup().await;
        let now = Utc::now();
        scheduler
            .register(pid, now + chrono::Duration::seconds(60))
            .await
            .unwrap();

        assert!(scheduler.fire_due(now).await.unwrap().is_empty());
        assert!(
            !storage
                .get_project_by_id(pid)
                .await
                .unwrap()
                .unwrap()
                .grace_passed
        );

        let fired = scheduler
            .fire_due(now + chrono::Duration::seconds(61))
            .await
            .unwrap();
        assert_eq!(fired, vec![pid]);
        let project = storage.get_project_by_id(pid).await.unwrap().unwrap();
        assert!(project.uploaded);
        assert!(project.grace_passed);
        assert_eq!(scheduler.lookup(pid).await.unwrap(), None);

        // 再次扫描不会重复触发
        assert!(
            scheduler
                .fire_due(now + chrono::Duration::days(1))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_cancel_leaves_flags_alone() {
        let (storage, scheduler, pid) = setup().await;
        scheduler
            .register(pid, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();

        assert!(scheduler.cancel(pid).await.unwrap());
        assert!(!scheduler.cancel(pid).await.unwrap());

        assert!(scheduler.fire_due(Utc::now()).await.unwrap().is_empty());
        let project = storage.get_project_by_id(pid).await.unwrap().unwrap();
        assert!(project.uploaded);
        assert!(!project.grace_passed);
    }

    #[tokio::test]
    async fn test_close_now() {
        let (_storage, scheduler, pid) = setup().await;
        assert!(scheduler.close_now(pid).await.unwrap().is_none());

        scheduler
            .register(pid, Utc::now() + chrono::Duration::days(7))
            .await
            .unwrap();
        let project = scheduler.close_now(pid).await.unwrap().unwrap();
        assert!(project.grace_passed);
        assert_eq!(scheduler.lookup(pid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_after_cancel() {
        let (storage, scheduler, pid) = setup().await;
        scheduler
            .register(pid, Utc::now() + chrono::Duration::days(7))
            .await
            .unwrap();
        assert!(scheduler.cancel(pid).await.unwrap());

        let project = scheduler.close_now(pid).await.unwrap().unwrap();
        assert!(project.uploaded);
        assert!(project.grace_passed);
        assert!(
            storage
                .get_project_by_id(pid)
                .await
                .unwrap()
                .unwrap()
                .grace_passed
        );

        // 已关闭的窗口不能再次关闭
        assert!(scheduler.close_now(pid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spawned_loop_fires_on_first_tick() {
        let (storage, scheduler, pid) = setup().await;
        scheduler
            .register(pid, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();

        let handle = scheduler.clone().spawn(Duration::from_secs(3600));
        let mut closed = false;
        for _ in 0..50 {
            if storage
                .get_project_by_id(pid)
                .await
                .unwrap()
                .unwrap()
                .grace_passed
            {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert!(closed);
    }
}
