use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProjectService;
use crate::errors::Result;
use crate::middlewares::RequireJWT;
use crate::models::projects::responses::MyProjectsResponse;
use crate::models::users::entities::{Capability, User};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::portal_error_response;

/// 按能力分别列出学生、COGS 评阅人和导师身份下的项目
pub async fn my_projects(service: &ProjectService, user: &User) -> Result<MyProjectsResponse> {
    let as_student = if user.can(Capability::JoinProjects) {
        Some(service.storage.list_projects_by_student(user.id).await?)
    } else {
        None
    };

    let as_cogs_marker = if user.can(Capability::ReviewOtherProjects) {
        Some(service.storage.list_projects_by_cogs_marker(user.id).await?)
    } else {
        None
    };

    let as_supervisor = if user.can(Capability::CreateProjects) {
        Some(service.storage.list_projects_by_supervisor(user.id).await?)
    } else {
        None
    };

    Ok(MyProjectsResponse {
        as_student,
        as_cogs_marker,
        as_supervisor,
    })
}

pub async fn handle_my_projects(
    service: &ProjectService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    match my_projects(service, &user).await {
        Ok(projects) => Ok(HttpResponse::Ok().json(ApiResponse::success(projects, "My projects"))),
        Err(e) => Ok(portal_error_response(&e)),
    }
}
