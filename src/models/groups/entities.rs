use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 轮转分组
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct ProjectGroup {
    pub id: i64,
    pub series: i32,
    pub part: i32,
    pub student_uploadable: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProjectGroup {
    /// 存储文件名的键：`{series}_{part}`
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.series, self.part)
    }
}
