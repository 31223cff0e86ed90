//! 预导入模块，方便使用

pub use super::grace_jobs::{
    ActiveModel as GraceJobActiveModel, Entity as GraceJobs, Model as GraceJobModel,
};
pub use super::project_groups::{
    ActiveModel as ProjectGroupActiveModel, Entity as ProjectGroups, Model as ProjectGroupModel,
};
pub use super::projects::{
    ActiveModel as ProjectActiveModel, Entity as Projects, Model as ProjectModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
