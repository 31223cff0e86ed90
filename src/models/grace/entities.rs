use serde::{Deserialize, Serialize};
use ts_rs::TS;

const JOB_NAME_PREFIX: &str = "grace_deadline_";

// 宽限期截止任务，每个项目至多一个
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grace.ts")]
pub struct GraceJob {
    pub name: String,
    pub project_id: i64,
    pub fire_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl GraceJob {
    /// 任务名：`grace_deadline_{project_id}`
    pub fn job_name(project_id: i64) -> String {
        format!("{JOB_NAME_PREFIX}{project_id}")
    }
}
