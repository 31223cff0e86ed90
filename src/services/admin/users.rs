use actix_web::{HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::AdminService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::utils::password::hash_password;
use crate::utils::portal_error_response;
use crate::utils::validate::{
    validate_display_name, validate_email, validate_password, validate_username,
};

pub async fn handle_create_user(
    service: &AdminService,
    mut user_data: CreateUserRequest,
) -> ActixResult<HttpResponse> {
    // 验证用户名
    if let Err(msg) = validate_username(&user_data.username) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }

    // 验证邮箱
    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }

    // 姓名会出现在下载文件名中
    if let Err(msg) = validate_display_name(&user_data.name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    user_data.name = user_data.name.trim().to_string();

    if let Err(msg) = validate_password(&user_data.password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    user_data.password = match hash_password(&service.argon2, &user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Password hashing failed",
                )),
            );
        }
    };

    match service.storage.create_user(user_data).await {
        Ok(user) => {
            info!("Created {} account {}", user.role, user.username);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created")))
        }
        Err(PortalError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::UserAlreadyExists, msg))),
        Err(e) => Ok(portal_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::admin::test_service;
    use crate::utils::password::verify_password;
    use actix_web::http::StatusCode;

    fn request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            name: " Alice Smith ".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: UserRole::Student,
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let service = test_service().await;
        let resp = handle_create_user(&service, request("alice", "alice@example.ac.uk", "Rotation2024"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let user = service
            .storage
            .get_user_by_username_or_email("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "Alice Smith");
        assert_ne!(user.password_hash, "Rotation2024");
        assert!(verify_password("Rotation2024", &user.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let service = test_service().await;
        handle_create_user(&service, request("alice", "alice@example.ac.uk", "Rotation2024"))
            .await
            .unwrap();
        let resp = handle_create_user(&service, request("alice", "other@example.ac.uk", "Rotation2024"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_rejects_invalid_input() {
        let service = test_service().await;
        for req in [
            request("a", "alice@example.ac.uk", "Rotation2024"),
            request("alice", "not-an-email", "Rotation2024"),
            request("alice", "alice@example.ac.uk", "short"),
        ] {
            let resp = handle_create_user(&service, req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(service.storage.count_users().await.unwrap(), 0);
    }
}
