use actix_web::{HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::errors::{PortalError, Result};
use crate::models::users::entities::Capability;
use crate::models::{
    ApiResponse, ErrorCode,
    projects::{requests::CreateProjectRequest, responses::ProjectResponse},
};
use crate::utils::portal_error_response;

/// 检查项目引用的分组与用户是否存在且角色匹配
async fn check_references(service: &AdminService, req: &CreateProjectRequest) -> Result<()> {
    if req.title.trim().is_empty() {
        return Err(PortalError::validation("Project title must not be empty"));
    }

    if service.storage.get_group_by_id(req.group_id).await?.is_none() {
        return Err(PortalError::validation(format!(
            "Group {} does not exist",
            req.group_id
        )));
    }

    let members = [
        ("student", req.student_id, Some(Capability::JoinProjects)),
        ("supervisor", req.supervisor_id, None),
        ("cogs marker", req.cogs_marker_id, None),
    ];
    for (label, user_id, required) in members {
        let Some(user_id) = user_id else {
            continue;
        };
        let user = service
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| PortalError::validation(format!("The {label} {user_id} does not exist")))?;
        if let Some(capability) = required
            && !user.can(capability)
        {
            return Err(PortalError::validation(format!(
                "User {} cannot be assigned as {label}",
                user.username
            )));
        }
    }

    // 每个学生在一个分组中只有一个项目
    if let Some(student_id) = req.student_id
        && service
            .storage
            .get_student_project_in_group(req.group_id, student_id)
            .await?
            .is_some()
    {
        return Err(PortalError::conflict(
            "Student already has a project in this group",
        ));
    }

    Ok(())
}

pub async fn handle_create_project(
    service: &AdminService,
    project_data: CreateProjectRequest,
) -> ActixResult<HttpResponse> {
    match check_references(service, &project_data).await {
        Ok(()) => {}
        Err(PortalError::Validation(msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ProjectReferenceInvalid,
                msg,
            )));
        }
        Err(e) => return Ok(portal_error_response(&e)),
    }

    match service.storage.create_project(project_data).await {
        Ok(project) => {
            tracing::info!("Created project {} in group {}", project.id, project.group_id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(ProjectResponse { project }, "Project created")))
        }
        Err(e) => Ok(portal_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::groups::requests::CreateGroupRequest;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::services::admin::test_service;
    use actix_web::http::StatusCode;

    async fn seed(service: &AdminService) -> (i64, i64, i64) {
        let group = service
            .storage
            .create_group(CreateGroupRequest {
                series: 3,
                part: 1,
                student_uploadable: None,
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (username, role) in [("alice", UserRole::Student), ("carol", UserRole::Supervisor)] {
            let user = service
                .storage
                .create_user(CreateUserRequest {
                    username: username.to_string(),
                    name: username.to_string(),
                    email: format!("{username}@example.ac.uk"),
                    password: "hash".to_string(),
                    role,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (group.id, ids[0], ids[1])
    }

    fn project(group_id: i64, student: Option<i64>, supervisor: Option<i64>) -> CreateProjectRequest {
        CreateProjectRequest {
            title: "Neural circuits".to_string(),
            group_id,
            student_id: student,
            cogs_marker_id: None,
            supervisor_id: supervisor,
        }
    }

    #[tokio::test]
    async fn test_create_project() {
        let service = test_service().await;
        let (group_id, student, supervisor) = seed(&service).await;

        let resp = handle_create_project(&service, project(group_id, Some(student), Some(supervisor)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let created = service
            .storage
            .get_student_project_in_group(group_id, student)
            .await
            .unwrap()
            .unwrap();
        assert!(!created.uploaded);
        assert!(!created.grace_passed);
        assert_eq!(created.supervisor_id, Some(supervisor));
    }

    #[tokio::test]
    async fn test_rejects_bad_references() {
        let service = test_service().await;
        let (group_id, student, supervisor) = seed(&service).await;

        // 分组不存在
        let resp = handle_create_project(&service, project(999, Some(student), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // 导师不能作为学生
        let resp = handle_create_project(&service, project(group_id, Some(supervisor), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // 用户不存在
        let resp = handle_create_project(&service, project(group_id, None, Some(999)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_one_project_per_student_per_group() {
        let service = test_service().await;
        let (group_id, student, _) = seed(&service).await;

        handle_create_project(&service, project(group_id, Some(student), None))
            .await
            .unwrap();
        let resp = handle_create_project(&service, project(group_id, Some(student), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
