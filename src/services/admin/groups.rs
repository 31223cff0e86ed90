use actix_web::{HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode,
    groups::{requests::CreateGroupRequest, responses::GroupResponse},
};
use crate::utils::portal_error_response;

pub async fn handle_create_group(
    service: &AdminService,
    group_data: CreateGroupRequest,
) -> ActixResult<HttpResponse> {
    if group_data.series < 1 || group_data.part < 1 {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            "Series and part must be positive",
        )));
    }

    match service.storage.create_group(group_data).await {
        Ok(group) => {
            tracing::info!("Created project group {}", group.storage_key());
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(GroupResponse { group }, "Group created")))
        }
        Err(PortalError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::GroupAlreadyExists, msg))),
        Err(e) => Ok(portal_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::admin::test_service;
    use actix_web::http::StatusCode;

    fn group(series: i32, part: i32) -> CreateGroupRequest {
        CreateGroupRequest {
            series,
            part,
            student_uploadable: None,
        }
    }

    #[tokio::test]
    async fn test_most_recent_group_follows_series_and_part() {
        let service = test_service().await;
        for (series, part) in [(2, 3), (3, 1), (2, 1)] {
            let resp = handle_create_group(&service, group(series, part)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let recent = service.storage.get_most_recent_group().await.unwrap().unwrap();
        assert_eq!(recent.storage_key(), "3_1");
        assert!(recent.student_uploadable);
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_groups() {
        let service = test_service().await;
        handle_create_group(&service, group(3, 1)).await.unwrap();

        let dup = handle_create_group(&service, group(3, 1)).await.unwrap();
        assert_eq!(dup.status(), StatusCode::CONFLICT);

        let bad = handle_create_group(&service, group(0, 1)).await.unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
