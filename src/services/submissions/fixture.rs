//! 提交服务测试夹具：内存数据库 + 临时上传目录

use std::sync::Arc;

use actix_web::web::Bytes;
use futures_util::stream;

use super::slot_store::tests::temp_root;
use super::{Slot, SlotStore, SubmissionService, upload};
use crate::errors::Result;
use crate::models::groups::entities::ProjectGroup;
use crate::models::groups::requests::CreateGroupRequest;
use crate::models::projects::entities::Project;
use crate::models::projects::requests::CreateProjectRequest;
use crate::models::projects::responses::SubmissionResponse;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::CreateUserRequest;
use crate::services::GraceScheduler;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::memory_storage;

pub(crate) struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub scheduler: GraceScheduler,
    pub service: SubmissionService,
    pub store: SlotStore,
    pub group: ProjectGroup,
    pub project: Project,
    pub student: User,
    pub other_student: User,
    pub supervisor: User,
    pub cogs_marker: User,
    pub grad_office: User,
}

async fn user(storage: &Arc<dyn Storage>, username: &str, name: &str, role: UserRole) -> User {
    storage
        .create_user(CreateUserRequest {
            username: username.to_string(),
            name: name.to_string(),
            email: format!("{username}@example.ac.uk"),
            password: "not-a-real-hash".to_string(),
            role,
        })
        .await
        .unwrap()
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_uploadable(true).await
    }

    pub async fn with_uploadable(student_uploadable: bool) -> Self {
        let storage = memory_storage().await;

        let student = user(&storage, "alice", "Alice Smith", UserRole::Student).await;
        let other_student = user(&storage, "bob", "Bob Jones", UserRole::Student).await;
        let supervisor = user(&storage, "carol", "Carol White", UserRole::Supervisor).await;
        let cogs_marker = user(&storage, "dave", "Dave Green", UserRole::CogsMember).await;
        let grad_office = user(&storage, "erin", "Erin Black", UserRole::GradOffice).await;

        // 较早的分组不应被选中
        storage
            .create_group(CreateGroupRequest {
                series: 2,
                part: 3,
                student_uploadable: Some(true),
            })
            .await
            .unwrap();
        let group = storage
            .create_group(CreateGroupRequest {
                series: 3,
                part: 1,
                student_uploadable: Some(student_uploadable),
            })
            .await
            .unwrap();

        let project = storage
            .create_project(CreateProjectRequest {
                title: "Synaptic plasticity".to_string(),
                group_id: group.id,
                student_id: Some(student.id),
                cogs_marker_id: Some(cogs_marker.id),
                supervisor_id: Some(supervisor.id),
            })
            .await
            .unwrap();

        let scheduler = GraceScheduler::new(storage.clone());
        let store = SlotStore::new(temp_root());
        let service = SubmissionService::new(
            storage.clone(),
            scheduler.clone(),
            store.clone(),
            chrono::Duration::days(7),
            255,
        );

        Self {
            storage,
            scheduler,
            service,
            store,
            group,
            project,
            student,
            other_student,
            supervisor,
            cogs_marker,
            grad_office,
        }
    }

    /// 以学生身份提交
    pub async fn submit(&self, filename: &str, content: &'static [u8]) -> Result<SubmissionResponse> {
        let body = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(content))]);
        upload::accept_submission(&self.service, &self.student, filename, body).await
    }

    /// 以学生身份提交，数据流在第一块之后中断
    pub async fn submit_broken(&self, filename: &str) -> Result<SubmissionResponse> {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ]);
        upload::accept_submission(&self.service, &self.student, filename, body).await
    }

    pub async fn reload_project(&self) -> Project {
        self.storage
            .get_project_by_id(self.project.id)
            .await
            .unwrap()
            .unwrap()
    }

    pub fn slot(&self) -> Slot {
        Slot::new(self.student.id, &self.group)
    }

    pub async fn slot_files(&self) -> Vec<String> {
        self.store.slot_files(&self.slot()).await
    }

    pub async fn read_slot(&self, extension: &str) -> Vec<u8> {
        tokio::fs::read(self.store.file_path(&self.slot(), extension))
            .await
            .unwrap()
    }

    pub async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(self.store.root()).await;
    }
}
