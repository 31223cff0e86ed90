use actix_web::{HttpResponse, Result as ActixResult};

use crate::errors::{PortalError, Result};
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;
use crate::utils::portal_error_response;

use super::AuthService;

const BAD_CREDENTIALS: &str = "Username or password is incorrect";

/// 校验用户名（或邮箱）与密码，签发访问令牌
pub async fn authenticate(
    service: &AuthService,
    login_request: LoginRequest,
) -> Result<LoginResponse> {
    // 1. 根据用户名或邮箱获取用户信息
    let user = service
        .storage
        .get_user_by_username_or_email(&login_request.username)
        .await?
        .ok_or_else(|| PortalError::authentication(BAD_CREDENTIALS))?;

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        return Err(PortalError::authentication(BAD_CREDENTIALS));
    }

    // 3. 生成令牌
    let access_token =
        JwtUtils::generate_access_token(&service.jwt, user.id, &user.role.to_string()).map_err(
            |e| PortalError::authentication(format!("Unable to generate token: {e}")),
        )?;

    tracing::info!("User {} logged in successfully", user.username);

    Ok(LoginResponse {
        access_token,
        expires_in: service.jwt.access_token_expiry * 60, // 转换为秒
        user,
        created_at: chrono::Utc::now(),
    })
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
) -> ActixResult<HttpResponse> {
    match authenticate(service, login_request).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Login successful"))),
        Err(PortalError::Authentication(msg)) if msg == BAD_CREDENTIALS => Ok(
            HttpResponse::Unauthorized().json(ApiResponse::error_empty(ErrorCode::AuthFailed, msg)),
        ),
        Err(PortalError::Authentication(msg)) => {
            tracing::error!("Failed to generate JWT token: {}", msg);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            )
        }
        Err(e) => Ok(portal_error_response(&e)),
    }
}
