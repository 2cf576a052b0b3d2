#![forbid(unsafe_code)]

use hist_core::history::PublishTag;
use hist_core::ids::{PrincipalId, ProjectId, StructureId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletedResourcesRequest {
    /// Restrict to entries recorded below this folder.
    pub parent_id: Option<StructureId>,
    /// Restrict to entries last modified by this user.
    pub user_id: Option<PrincipalId>,
    /// Path prefix consulted when the primary lookup finds nothing.
    pub path_hint: Option<String>,
}

impl DeletedResourcesRequest {
    pub fn below(parent_id: StructureId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectInfo {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner_id: PrincipalId,
    pub user_group_id: PrincipalId,
    pub manager_group_id: PrincipalId,
    pub date_created: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteProjectRequest {
    pub publish_tag: PublishTag,
    pub publish_date: i64,
    pub published_by: PrincipalId,
    pub project: ProjectInfo,
    pub paths: Vec<String>,
}
