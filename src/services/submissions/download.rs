use std::path::PathBuf;

use actix_web::http::header::{
    CONTENT_TYPE, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::{Slot, SubmissionService};
use crate::errors::{PortalError, Result};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::{Capability, User};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::portal_error_response;

const NOT_FOUND: &str = "Not found";
const NOT_AUTHORISED: &str = "Not authorised";

/// 待下载的提交文件
#[derive(Debug, Clone)]
pub struct SubmissionDownload {
    pub path: PathBuf,
    pub size: u64,
    /// 展示给浏览器的文件名：`{学生姓名}_{series}_{part}.{ext}`
    pub display_name: String,
}

/// 定位项目的提交文件
///
/// 项目参与者或具备 `ViewAllSubmittedProjects` 能力的用户可以下载。
pub async fn prepare_download(
    service: &SubmissionService,
    user: &User,
    project_id: i64,
) -> Result<SubmissionDownload> {
    let project = service
        .storage
        .get_project_by_id(project_id)
        .await?
        .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;

    if !project.is_participant(user.id) && !user.can(Capability::ViewAllSubmittedProjects) {
        tracing::info!(
            "User {} denied download of project {}",
            user.username,
            project_id
        );
        return Err(PortalError::authorization_denied(NOT_AUTHORISED));
    }

    let (Some(student_id), Some(extension)) =
        (project.student_id, project.submission_extension.as_deref())
    else {
        return Err(PortalError::not_found(NOT_FOUND));
    };

    let group = service
        .storage
        .get_group_by_id(project.group_id)
        .await?
        .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;
    let student = service
        .storage
        .get_user_by_id(student_id)
        .await?
        .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;

    let slot = Slot::new(student_id, &group);
    let stored = service
        .store
        .locate(&slot, extension)
        .await?
        .ok_or_else(|| PortalError::not_found(NOT_FOUND))?;

    Ok(SubmissionDownload {
        path: stored.path,
        size: stored.size,
        display_name: format!("{}_{}", student.name, slot.file_name(extension)),
    })
}

pub async fn handle_download(
    service: &SubmissionService,
    request: &HttpRequest,
    project_id: i64,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    let download = match prepare_download(service, &user, project_id).await {
        Ok(download) => download,
        Err(PortalError::AuthorizationDenied(msg)) => {
            return Ok(plain_text(HttpResponse::Forbidden(), msg));
        }
        Err(PortalError::NotFound(msg)) => {
            return Ok(plain_text(HttpResponse::NotFound(), msg));
        }
        Err(e) => return Ok(portal_error_response(&e)),
    };

    let file = match File::open(&download.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(plain_text(HttpResponse::NotFound(), NOT_FOUND.to_string()));
        }
        Err(e) => return Ok(portal_error_response(&e.into())),
    };

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "application/octet-stream"))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(download.display_name)],
        })
        .streaming(ReaderStream::new(file)))
}

fn plain_text(mut builder: actix_web::HttpResponseBuilder, body: String) -> HttpResponse {
    builder
        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
        .body(body)
}
