use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum UserRole {
    Student,    // 轮转学生
    Supervisor, // 项目导师
    CogsMember, // COGS 评阅人
    GradOffice, // 研究生办公室（管理员）
}

// 角色所附带的能力
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum Capability {
    JoinProjects,
    CreateProjects,
    ReviewOtherProjects,
    ViewAllSubmittedProjects,
    ManageGroups,
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const SUPERVISOR: &'static str = "supervisor";
    pub const COGS_MEMBER: &'static str = "cogs_member";
    pub const GRAD_OFFICE: &'static str = "grad_office";

    /// 角色拥有的能力
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            UserRole::Student => &[Capability::JoinProjects],
            UserRole::Supervisor => &[Capability::CreateProjects],
            UserRole::CogsMember => &[Capability::ReviewOtherProjects],
            UserRole::GradOffice => &[
                Capability::CreateProjects,
                Capability::ViewAllSubmittedProjects,
                Capability::ManageGroups,
            ],
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, supervisor, cogs_member, grad_office"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Supervisor => write!(f, "{}", UserRole::SUPERVISOR),
            UserRole::CogsMember => write!(f, "{}", UserRole::COGS_MEMBER),
            UserRole::GradOffice => write!(f, "{}", UserRole::GRAD_OFFICE),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::SUPERVISOR => Ok(UserRole::Supervisor),
            UserRole::COGS_MEMBER => Ok(UserRole::CogsMember),
            UserRole::GRAD_OFFICE => Ok(UserRole::GradOffice),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.has(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [
            UserRole::Student,
            UserRole::Supervisor,
            UserRole::CogsMember,
            UserRole::GradOffice,
        ] {
            assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
        }
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_capability_matrix() {
        assert!(UserRole::Student.has(Capability::JoinProjects));
        assert!(!UserRole::Student.has(Capability::ViewAllSubmittedProjects));
        assert!(!UserRole::Supervisor.has(Capability::JoinProjects));
        assert!(UserRole::CogsMember.has(Capability::ReviewOtherProjects));
        assert!(UserRole::GradOffice.has(Capability::ViewAllSubmittedProjects));
        assert!(UserRole::GradOffice.has(Capability::ManageGroups));
        assert!(!UserRole::GradOffice.has(Capability::JoinProjects));
    }

    #[test]
    fn test_role_deserialize_rejects_unknown() {
        let ok: UserRole = serde_json::from_str("\"cogs_member\"").unwrap();
        assert_eq!(ok, UserRole::CogsMember);
        assert!(serde_json::from_str::<UserRole>("\"lecturer\"").is_err());
    }
}
