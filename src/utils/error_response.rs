use actix_web::error::{InternalError, JsonPayloadError, PathError};
use actix_web::{HttpRequest, HttpResponse, http::StatusCode};

use crate::errors::PortalError;
use crate::models::{ApiResponse, ErrorCode};

/// 将服务层错误转换为统一的 JSON 错误响应
pub fn portal_error_response(err: &PortalError) -> HttpResponse {
    let (status, code) = match err {
        PortalError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
        PortalError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        PortalError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::AuthFailed),
        PortalError::AuthorizationDenied(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        PortalError::WindowClosed(_) => {
            (StatusCode::FORBIDDEN, ErrorCode::SubmissionWindowClosed)
        }
        PortalError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        PortalError::DuplicateJob(_)
        | PortalError::DatabaseConfig(_)
        | PortalError::DatabaseConnection(_)
        | PortalError::DatabaseOperation(_)
        | PortalError::FileOperation(_) => {
            tracing::error!("{}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
            )
        }
    };

    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}

/// JSON 请求体解析失败时返回统一格式
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid JSON payload: {err}"),
    ));
    InternalError::from_response(err, response).into()
}

/// 路径参数解析失败时返回统一格式
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid path parameter: {err}"),
    ));
    InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PortalError::validation("x"), StatusCode::BAD_REQUEST),
            (PortalError::not_found("x"), StatusCode::NOT_FOUND),
            (PortalError::authorization_denied("x"), StatusCode::FORBIDDEN),
            (PortalError::window_closed("x"), StatusCode::FORBIDDEN),
            (PortalError::duplicate_job("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (PortalError::file_operation("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(portal_error_response(&err).status(), status);
        }
    }
}
