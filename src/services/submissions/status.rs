use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header::CONTENT_TYPE};

use super::SubmissionService;
use crate::errors::{PortalError, Result};
use crate::middlewares::RequireJWT;
use crate::models::projects::responses::UploadStatusResponse;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::portal_error_response;

/// 截止时间的展示格式
pub const GRACE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const GRACE_EXCEEDED: &str = "Grace time exceeded";

/// 上传页面所需的状态；宽限期已过时返回 `WindowClosed`
pub async fn upload_status(
    service: &SubmissionService,
    user: &User,
) -> Result<UploadStatusResponse> {
    let group = service.current_group(user).await?;
    let project = service.student_project(&group, user).await?;

    if project.grace_passed {
        return Err(PortalError::window_closed(GRACE_EXCEEDED));
    }

    let project_grace = service
        .scheduler
        .lookup(project.id)
        .await?
        .map(|fire_at| fire_at.format(GRACE_DISPLAY_FORMAT).to_string());

    Ok(UploadStatusResponse {
        project,
        grace_time: service.grace_period.num_seconds(),
        project_grace,
    })
}

pub async fn handle_upload_status(
    service: &SubmissionService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    match upload_status(service, &user).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status, "Upload status"))),
        Err(PortalError::WindowClosed(msg)) => Ok(HttpResponse::Forbidden()
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .body(msg)),
        Err(e) => Ok(portal_error_response(&e)),
    }
}
