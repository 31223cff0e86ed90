use serde::Serialize;
use ts_rs::TS;

use super::entities::Project;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct ProjectResponse {
    pub project: Project,
}

// 上传页面状态
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct UploadStatusResponse {
    pub project: Project,
    /// 配置的宽限期（秒）
    pub grace_time: i64,
    /// 宽限期截止时间，格式 `%Y-%m-%d %H:%M`；尚未提交时为空
    pub project_grace: Option<String>,
}

// 提交成功
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct SubmissionResponse {
    pub success: bool,
    pub project_id: i64,
    /// 存储文件名，如 `3_1.pdf`
    pub stored_as: String,
    pub first_submission: bool,
}

// 当前用户按身份参与的项目；角色不具备相应能力时省略该列表
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct MyProjectsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_student: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_cogs_marker: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_supervisor: Option<Vec<Project>>,
}
