use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 轮转项目
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "project.ts")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub group_id: i64,
    pub student_id: Option<i64>,
    pub cogs_marker_id: Option<i64>,
    pub supervisor_id: Option<i64>,
    /// 是否曾经提交过文件
    pub uploaded: bool,
    /// 宽限期是否已过，只在 uploaded 为 true 时有意义
    pub grace_passed: bool,
    /// 当前存储文件的扩展名
    pub submission_extension: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Project {
    /// 用户是否为该项目的学生、COGS 评阅人或导师
    pub fn is_participant(&self, user_id: i64) -> bool {
        [self.student_id, self.cogs_marker_id, self.supervisor_id].contains(&Some(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(student: Option<i64>, marker: Option<i64>, supervisor: Option<i64>) -> Project {
        Project {
            id: 1,
            title: "Cell imaging".to_string(),
            group_id: 1,
            student_id: student,
            cogs_marker_id: marker,
            supervisor_id: supervisor,
            uploaded: false,
            grace_passed: false,
            submission_extension: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_participants() {
        let p = project(Some(7), Some(8), Some(9));
        assert!(p.is_participant(7));
        assert!(p.is_participant(8));
        assert!(p.is_participant(9));
        assert!(!p.is_participant(10));
    }

    #[test]
    fn test_unassigned_roles_match_nobody() {
        let p = project(None, None, Some(3));
        assert!(!p.is_participant(0));
        assert!(p.is_participant(3));
    }
}
