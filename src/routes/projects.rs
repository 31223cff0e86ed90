use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::services::ProjectService;

pub async fn list_mine(
    service: web::Data<ProjectService>,
    request: HttpRequest,
) -> ActixResult<HttpResponse> {
    service.list_mine(&request).await
}

// 配置路由
pub fn configure_project_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/projects")
            .wrap(middlewares::RequireJWT)
            .route("/mine", web::get().to(list_mine)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::users::entities::User;
    use crate::services::submissions::fixture::Fixture;
    use crate::utils::jwt::JwtUtils;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "route-test-secret".to_string(),
            access_token_expiry: 10,
        }
    }

    fn mine_request(user: &User) -> test::TestRequest {
        let token =
            JwtUtils::generate_access_token(&jwt_config(), user.id, &user.role.to_string())
                .unwrap();
        test::TestRequest::get()
            .uri("/api/v1/projects/mine")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
    }

    #[actix_web::test]
    async fn test_marker_discovers_downloadable_project() {
        let fx = Fixture::new().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(jwt_config()))
                .app_data(web::Data::new(ProjectService::new(fx.storage.clone())))
                .configure(configure_project_routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/projects/mine")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(&app, mine_request(&fx.cogs_marker).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["data"]["as_cogs_marker"][0]["id"], fx.project.id);
        assert!(json["data"].get("as_student").is_none());
        assert!(json["data"].get("as_supervisor").is_none());

        let resp = test::call_service(&app, mine_request(&fx.student).to_request()).await;
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["data"]["as_student"][0]["id"], fx.project.id);
        assert!(json["data"].get("as_cogs_marker").is_none());

        fx.cleanup().await;
    }
}
