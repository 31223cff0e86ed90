use serde::Serialize;
use ts_rs::TS;

use crate::models::projects::entities::Project;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "grace.ts")]
pub struct GraceCancelResponse {
    pub project_id: i64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "grace.ts")]
pub struct GraceCloseResponse {
    pub project: Project,
}
