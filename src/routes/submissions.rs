use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::users::entities::Capability;
use crate::services::SubmissionService;

pub async fn upload_status(
    service: web::Data<SubmissionService>,
    request: HttpRequest,
) -> ActixResult<HttpResponse> {
    service.handle_upload_status(&request).await
}

pub async fn submit(
    service: web::Data<SubmissionService>,
    request: HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    service.handle_submission(&request, payload).await
}

pub async fn download(
    service: web::Data<SubmissionService>,
    request: HttpRequest,
    project_id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    service
        .handle_download(&request, project_id.into_inner())
        .await
}

// 配置路由
pub fn configure_submission_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("/upload")
                    .wrap(middlewares::RequireCapability::new(
                        Capability::JoinProjects,
                    ))
                    .route("", web::get().to(upload_status))
                    .route("", web::post().to(submit)),
            )
            .route("/download/{project_id}", web::get().to(download)),
    );
}
