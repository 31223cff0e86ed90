use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 业务错误码，写入 ApiResponse.code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "api.ts")]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1010,
    AuthFailed = 1011,
    Forbidden = 1012,
    NotFound = 1020,
    Conflict = 1030,
    InternalServerError = 1500,

    // 用户
    UserAlreadyExists = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,

    // 分组与项目
    GroupNotFound = 3001,
    GroupAlreadyExists = 3002,
    ProjectNotFound = 3101,
    ProjectReferenceInvalid = 3102,

    // 学生提交
    SubmissionWindowClosed = 4001,
    SubmissionFileNotFound = 4002,
    SubmissionFileInvalid = 4003,
    SubmissionUploadFailed = 4004,
    GraceWindowNotOpen = 4005,
}
