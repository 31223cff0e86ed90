use actix_web::{HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::errors::{PortalError, Result};
use crate::models::grace::responses::{GraceCancelResponse, GraceCloseResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::portal_error_response;

async fn ensure_project(service: &AdminService, project_id: i64) -> Result<()> {
    match service.storage.get_project_by_id(project_id).await? {
        Some(_) => Ok(()),
        None => Err(PortalError::not_found(format!(
            "Project {project_id} not found"
        ))),
    }
}

/// 立即关闭项目的提交窗口
pub async fn handle_close_grace(
    service: &AdminService,
    project_id: i64,
) -> ActixResult<HttpResponse> {
    if let Err(e) = ensure_project(service, project_id).await {
        return Ok(portal_error_response(&e));
    }

    match service.scheduler.close_now(project_id).await {
        Ok(Some(project)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            GraceCloseResponse { project },
            "Grace window closed",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GraceWindowNotOpen,
            "Project has no open grace window",
        ))),
        Err(e) => Ok(portal_error_response(&e)),
    }
}

/// 取消项目的宽限期任务，项目标志保持不变
pub async fn handle_cancel_grace(
    service: &AdminService,
    project_id: i64,
) -> ActixResult<HttpResponse> {
    if let Err(e) = ensure_project(service, project_id).await {
        return Ok(portal_error_response(&e));
    }

    match service.scheduler.cancel(project_id).await {
        Ok(cancelled) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            GraceCancelResponse {
                project_id,
                cancelled,
            },
            if cancelled {
                "Grace deadline cancelled"
            } else {
                "No pending grace deadline"
            },
        ))),
        Err(e) => Ok(portal_error_response(&e)),
    }
}
