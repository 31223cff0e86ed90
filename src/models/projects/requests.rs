use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct CreateProjectRequest {
    pub title: String,
    pub group_id: i64,
    pub student_id: Option<i64>,
    pub cogs_marker_id: Option<i64>,
    pub supervisor_id: Option<i64>,
}
