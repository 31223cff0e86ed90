use serde::Serialize;
use ts_rs::TS;

use super::entities::ProjectGroup;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct GroupResponse {
    pub group: ProjectGroup,
}
