use std::fmt::Display;

use actix_multipart::{Field, Multipart};
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::{Stream, TryStreamExt};
use tracing::{error, info};

use super::{Slot, SubmissionService};
use crate::errors::{PortalError, Result};
use crate::middlewares::RequireJWT;
use crate::models::groups::entities::ProjectGroup;
use crate::models::projects::responses::SubmissionResponse;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::{portal_error_response, submission_extension};

use super::status::GRACE_EXCEEDED;

/// 表单中各部分按位置区分：第 1 部分为文件名，第 3 部分为文件内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionPart {
    FileName,
    Content,
    Ignored,
}

impl SubmissionPart {
    fn at(index: usize) -> Self {
        match index {
            1 => SubmissionPart::FileName,
            3 => SubmissionPart::Content,
            _ => SubmissionPart::Ignored,
        }
    }
}

/// 接收一次提交
///
/// 首次提交登记宽限期任务；之后在宽限期内的提交替换旧文件；宽限期已过返回 `WindowClosed`。
pub async fn accept_submission<S, E>(
    service: &SubmissionService,
    user: &User,
    filename: &str,
    body: S,
) -> Result<SubmissionResponse>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let group = service.current_group(user).await?;

    let lock = service.slot_lock(user.id, group.id);
    let result = {
        let _guard = lock.lock().await;
        accept_locked(service, user, &group, filename, body).await
    };
    drop(lock);
    service.release_slot_lock(user.id, group.id);
    result
}

// 持有槽位锁时调用，项目状态在锁内重新读取
async fn accept_locked<S, E>(
    service: &SubmissionService,
    user: &User,
    group: &ProjectGroup,
    filename: &str,
    body: S,
) -> Result<SubmissionResponse>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let project = service.student_project(group, user).await?;
    let slot = Slot::new(user.id, group);

    if project.grace_passed {
        info!(
            "Rejected late submission from {} for project {}",
            user.username, project.id
        );
        return Err(PortalError::window_closed(GRACE_EXCEEDED));
    }

    let extension = submission_extension(filename)?;

    let first_submission = !project.uploaded;
    if first_submission {
        let fire_at = chrono::Utc::now() + service.grace_period;
        service.scheduler.register(project.id, fire_at).await?;
    }

    // 先记录扩展名再替换文件；替换失败时恢复原扩展名，旧文件仍在原位
    let previous = project.submission_extension.as_deref();
    service
        .storage
        .set_submission_extension(project.id, Some(&extension))
        .await?;
    let stored = match service.store.replace(&slot, &extension, body).await {
        Ok(stored) => stored,
        Err(e) => {
            if let Err(restore) = service
                .storage
                .set_submission_extension(project.id, previous)
                .await
            {
                error!(
                    "Failed to restore extension of project {} after {}: {}",
                    project.id, e, restore
                );
            }
            return Err(e);
        }
    };

    info!(
        "Stored submission {} ({} bytes) for project {} by {}",
        stored.path.display(),
        stored.size,
        project.id,
        user.username
    );

    Ok(SubmissionResponse {
        success: true,
        project_id: project.id,
        stored_as: slot.file_name(&extension),
        first_submission,
    })
}

pub async fn handle_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    let mut filename: Option<String> = None;
    let mut index = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        match SubmissionPart::at(index) {
            SubmissionPart::FileName => {
                match read_text_field(&mut field, service.max_filename_len).await? {
                    Some(name) => filename = Some(name),
                    None => {
                        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                            ErrorCode::SubmissionFileInvalid,
                            "Filename is missing or too long",
                        )));
                    }
                }
            }
            SubmissionPart::Content => {
                let Some(name) = filename.as_deref() else {
                    return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                        ErrorCode::SubmissionFileInvalid,
                        "Filename part is missing",
                    )));
                };
                return Ok(match accept_submission(service, &user, name, field).await {
                    Ok(receipt) => HttpResponse::Ok()
                        .json(ApiResponse::success(receipt, "File uploaded successfully")),
                    Err(PortalError::Validation(msg)) => HttpResponse::BadRequest()
                        .json(ApiResponse::error_empty(ErrorCode::SubmissionFileInvalid, msg)),
                    Err(e @ PortalError::FileOperation(_)) => {
                        error!("{}", e);
                        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                            ErrorCode::SubmissionUploadFailed,
                            "Failed to store the uploaded file",
                        ))
                    }
                    Err(e) => portal_error_response(&e),
                });
            }
            SubmissionPart::Ignored => drain_field(&mut field).await?,
        }
        index += 1;
    }

    Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::SubmissionFileNotFound,
        "No file found in upload payload",
    )))
}

/// 读取文本部分；超长、为空或不是 UTF-8 时返回 None
async fn read_text_field(field: &mut Field, max_len: usize) -> ActixResult<Option<String>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if buf.len() + chunk.len() > max_len {
            drain_field(field).await?;
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8(buf)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

async fn drain_field(field: &mut Field) -> ActixResult<()> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::submissions::fixture::Fixture;
    use futures_util::stream;

    #[test]
    fn test_parts_are_positional() {
        assert_eq!(SubmissionPart::at(0), SubmissionPart::Ignored);
        assert_eq!(SubmissionPart::at(1), SubmissionPart::FileName);
        assert_eq!(SubmissionPart::at(2), SubmissionPart::Ignored);
        assert_eq!(SubmissionPart::at(3), SubmissionPart::Content);
        assert_eq!(SubmissionPart::at(4), SubmissionPart::Ignored);
    }

    #[tokio::test]
    async fn test_first_submission_registers_deadline() {
        let fx = Fixture::new().await;
        let before = chrono::Utc::now();

        let receipt = fx.submit("report.pdf", b"version one").await.unwrap();
        assert!(receipt.success);
        assert!(receipt.first_submission);
        assert_eq!(receipt.stored_as, "3_1.pdf");

        let project = fx.reload_project().await;
        assert!(project.uploaded);
        assert!(!project.grace_passed);
        assert_eq!(project.submission_extension.as_deref(), Some("pdf"));

        let fire_at = fx.scheduler.lookup(project.id).await.unwrap().unwrap();
        let expected = before + chrono::Duration::days(7);
        assert!((fire_at.timestamp() - expected.timestamp()).abs() <= 2);

        assert_eq!(fx.slot_files().await, vec!["3_1.pdf".to_string()]);
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_resubmission_keeps_deadline_and_replaces_file() {
        let fx = Fixture::new().await;
        fx.submit("report.pdf", b"version one").await.unwrap();
        let deadline = fx.scheduler.lookup(fx.project.id).await.unwrap();

        let receipt = fx.submit("final.docx", b"version two").await.unwrap();
        assert!(!receipt.first_submission);
        assert_eq!(receipt.stored_as, "3_1.docx");

        assert_eq!(fx.scheduler.lookup(fx.project.id).await.unwrap(), deadline);
        assert_eq!(fx.slot_files().await, vec!["3_1.docx".to_string()]);
        assert_eq!(fx.read_slot("docx").await, b"version two");
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_submission_after_window_is_rejected() {
        let fx = Fixture::new().await;
        fx.submit("report.pdf", b"version one").await.unwrap();
        let fired = fx
            .scheduler
            .fire_due(chrono::Utc::now() + chrono::Duration::days(8))
            .await
            .unwrap();
        assert_eq!(fired, vec![fx.project.id]);

        let err = fx.submit("late.pdf", b"too late").await.unwrap_err();
        assert!(matches!(err, PortalError::WindowClosed(_)));
        assert_eq!(fx.read_slot("pdf").await, b"version one");
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_invalid_filename_changes_nothing() {
        let fx = Fixture::new().await;

        let err = fx.submit("README", b"no extension").await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));

        let project = fx.reload_project().await;
        assert!(!project.uploaded);
        assert_eq!(fx.scheduler.lookup(project.id).await.unwrap(), None);
        assert!(fx.slot_files().await.is_empty());
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_non_student_cannot_submit() {
        let fx = Fixture::new().await;
        let err = accept_submission(
            &fx.service,
            &fx.supervisor,
            "report.pdf",
            stream::iter(vec![Ok::<_, String>(Bytes::from_static(b"x"))]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::AuthorizationDenied(_)));
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_broken_stream_keeps_previous_submission() {
        let fx = Fixture::new().await;
        fx.submit("report.pdf", b"version one").await.unwrap();

        let err = fx.submit_broken("final.docx").await.unwrap_err();
        assert!(matches!(err, PortalError::FileOperation(_)));

        let project = fx.reload_project().await;
        assert_eq!(project.submission_extension.as_deref(), Some("pdf"));
        assert_eq!(fx.slot_files().await, vec!["3_1.pdf".to_string()]);
        assert_eq!(fx.read_slot("pdf").await, b"version one");
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_broken_first_stream_records_no_extension() {
        let fx = Fixture::new().await;

        let err = fx.submit_broken("report.pdf").await.unwrap_err();
        assert!(matches!(err, PortalError::FileOperation(_)));

        let project = fx.reload_project().await;
        assert_eq!(project.submission_extension, None);
        assert!(fx.slot_files().await.is_empty());

        // 重试成功，截止时间不重复登记
        let receipt = fx.submit("report.pdf", b"retry").await.unwrap();
        assert!(!receipt.first_submission);
        assert_eq!(fx.read_slot("pdf").await, b"retry");
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_uploadable_flag_does_not_gate_submission() {
        let fx = Fixture::with_uploadable(false).await;
        let receipt = fx.submit("report.pdf", b"x").await.unwrap();
        assert!(receipt.first_submission);
        assert!(fx.reload_project().await.uploaded);
        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_concurrent_first_submissions_schedule_once() {
        let fx = Fixture::new().await;

        let (a, b) = tokio::join!(
            fx.submit("one.pdf", b"first"),
            fx.submit("two.txt", b"second")
        );
        let receipts = [a.unwrap(), b.unwrap()];
        assert_eq!(receipts.iter().filter(|r| r.first_submission).count(), 1);

        let files = fx.slot_files().await;
        assert_eq!(files.len(), 1);
        let project = fx.reload_project().await;
        assert_eq!(
            files[0],
            format!("3_1.{}", project.submission_extension.unwrap())
        );
        fx.cleanup().await;
    }
}
