use actix_web::{HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::groups::requests::CreateGroupRequest;
use crate::models::projects::requests::CreateProjectRequest;
use crate::models::users::entities::Capability;
use crate::models::users::requests::CreateUserRequest;
use crate::services::AdminService;

pub async fn create_user(
    service: web::Data<AdminService>,
    user_data: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    service.create_user(user_data.into_inner()).await
}

pub async fn create_group(
    service: web::Data<AdminService>,
    group_data: web::Json<CreateGroupRequest>,
) -> ActixResult<HttpResponse> {
    service.create_group(group_data.into_inner()).await
}

pub async fn create_project(
    service: web::Data<AdminService>,
    project_data: web::Json<CreateProjectRequest>,
) -> ActixResult<HttpResponse> {
    service.create_project(project_data.into_inner()).await
}

pub async fn close_grace(
    service: web::Data<AdminService>,
    project_id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    service.close_grace(project_id.into_inner()).await
}

pub async fn cancel_grace(
    service: web::Data<AdminService>,
    project_id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    service.cancel_grace(project_id.into_inner()).await
}

// 配置路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireCapability::new(Capability::ManageGroups))
                    .route("/users", web::post().to(create_user))
                    .route("/groups", web::post().to(create_group))
                    .route("/projects", web::post().to(create_project))
                    .route(
                        "/projects/{project_id}/grace/close",
                        web::post().to(close_grace),
                    )
                    .route("/projects/{project_id}/grace", web::delete().to(cancel_grace)),
            ),
    );
}
