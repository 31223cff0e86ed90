pub mod download;
pub mod slot_store;
pub mod status;
pub mod upload;

#[cfg(test)]
pub(crate) mod fixture;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::{PortalError, Result};
use crate::models::groups::entities::ProjectGroup;
use crate::models::projects::entities::Project;
use crate::models::users::entities::{Capability, User};
use crate::services::GraceScheduler;
use crate::storage::Storage;

pub use slot_store::{Slot, SlotStore, StoredFile};

/// 学生提交服务
///
/// 同一学生在同一分组下的提交按到达顺序串行处理，不同槽位之间互不阻塞。
pub struct SubmissionService {
    storage: Arc<dyn Storage>,
    scheduler: GraceScheduler,
    store: SlotStore,
    grace_period: chrono::Duration,
    max_filename_len: usize,
    slot_locks: DashMap<(i64, i64), Arc<Mutex<()>>>,
}

impl SubmissionService {
    pub fn new(
        storage: Arc<dyn Storage>,
        scheduler: GraceScheduler,
        store: SlotStore,
        grace_period: chrono::Duration,
        max_filename_len: usize,
    ) -> Self {
        Self {
            storage,
            scheduler,
            store,
            grace_period,
            max_filename_len,
            slot_locks: DashMap::new(),
        }
    }

    /// 上传页面状态
    pub async fn handle_upload_status(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        status::handle_upload_status(self, request).await
    }

    /// 接收学生提交
    pub async fn handle_submission(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_submission(self, request, payload).await
    }

    /// 下载项目的提交文件
    pub async fn handle_download(
        &self,
        request: &HttpRequest,
        project_id: i64,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, request, project_id).await
    }

    /// 当前分组，以及学生在其中的项目
    pub(crate) async fn current_group(&self, user: &User) -> Result<ProjectGroup> {
        if !user.can(Capability::JoinProjects) {
            return Err(PortalError::authorization_denied(
                "Only students can submit project files",
            ));
        }

        self.storage
            .get_most_recent_group()
            .await?
            .ok_or_else(|| PortalError::not_found("No project group has been configured"))
    }

    pub(crate) async fn student_project(
        &self,
        group: &ProjectGroup,
        user: &User,
    ) -> Result<Project> {
        self.storage
            .get_student_project_in_group(group.id, user.id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    "User {} has no project in group {}",
                    user.username,
                    group.storage_key()
                );
                PortalError::not_found("No project found for user in current group")
            })
    }

    fn slot_lock(&self, student_id: i64, group_id: i64) -> Arc<Mutex<()>> {
        self.slot_locks
            .entry((student_id, group_id))
            .or_default()
            .clone()
    }

    /// 没有其他请求持有时释放槽位锁
    fn release_slot_lock(&self, student_id: i64, group_id: i64) {
        self.slot_locks
            .remove_if(&(student_id, group_id), |_, lock| {
                Arc::strong_count(lock) == 1
            });
    }
}
