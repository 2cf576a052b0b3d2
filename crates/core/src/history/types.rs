#![forbid(unsafe_code)]

use crate::ids::{PrincipalId, ProjectId, PropertyDefId, ResourceId, StructureId};
use crate::paths::is_folder_path;
use serde::{Deserialize, Serialize};

pub type PublishTag = i64;

/// Lifecycle state codes. Ordering follows the code, so `max` yields the "more deleted" state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Unchanged,
    Changed,
    New,
    Deleted,
}

impl ResourceState {
    pub fn code(self) -> i64 {
        match self {
            Self::Unchanged => 0,
            Self::Changed => 1,
            Self::New => 2,
            Self::Deleted => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unchanged),
            1 => Some(Self::Changed),
            2 => Some(Self::New),
            3 => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn is_deleted(self) -> bool {
        self == Self::Deleted
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    File,
    Folder,
}

impl ResourceKind {
    pub fn from_path(path: &str) -> Self {
        if is_folder_path(path) {
            Self::Folder
        } else {
            Self::File
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub structure_id: StructureId,
    pub resource_id: ResourceId,
    pub path: String,
    pub parent_id: StructureId,
    pub date_released: i64,
    pub date_expired: i64,
    pub state: ResourceState,
    pub structure_version: i32,
    pub publish_tag: PublishTag,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub resource_id: ResourceId,
    pub type_id: i32,
    pub flags: i32,
    pub size: i64,
    pub date_content: i64,
    pub date_created: i64,
    pub user_created: PrincipalId,
    pub date_last_modified: i64,
    pub user_last_modified: PrincipalId,
    pub state: ResourceState,
    pub sibling_count: i32,
    pub resource_version: i32,
    pub publish_tag: PublishTag,
}

/// A structure snapshot joined with the resource snapshot it resolved to when it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectVersion {
    pub structure: StructureSnapshot,
    pub resource: ResourceSnapshot,
}

/// Reconstructed view of one version of a resource as seen through one structure entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalResource {
    pub kind: ResourceKind,
    pub publish_tag: PublishTag,
    pub structure_id: StructureId,
    pub resource_id: ResourceId,
    pub path: String,
    pub parent_id: StructureId,
    pub type_id: i32,
    pub flags: i32,
    pub state: ResourceState,
    pub date_created: i64,
    pub user_created: PrincipalId,
    pub date_last_modified: i64,
    pub user_last_modified: PrincipalId,
    pub date_released: i64,
    pub date_expired: i64,
    pub date_content: i64,
    pub size: i64,
    pub sibling_count: i32,
    pub version: i32,
    pub resource_version: i32,
    pub structure_version: i32,
}

impl HistoricalResource {
    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    Structure,
    Resource,
}

impl MappingType {
    pub fn code(self) -> i64 {
        match self {
            Self::Structure => 1,
            Self::Resource => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Structure),
            2 => Some(Self::Resource),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: PropertyDefId,
    pub name: String,
}

/// One stored value of a named property, as read back for merging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyValue {
    pub name: String,
    pub mapping_type: MappingType,
    pub value: String,
}

/// Effective property: at most one structure-scoped and one resource-scoped value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub structure_value: Option<String>,
    pub resource_value: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_structure_value(mut self, value: impl Into<String>) -> Self {
        self.structure_value = Some(value.into());
        self
    }

    pub fn with_resource_value(mut self, value: impl Into<String>) -> Self {
        self.resource_value = Some(value.into());
        self
    }

    /// Structure value wins over the shared resource value.
    pub fn value(&self) -> Option<&str> {
        self.structure_value
            .as_deref()
            .or(self.resource_value.as_deref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    Group,
}

impl PrincipalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalSnapshot {
    pub principal_id: PrincipalId,
    pub name: String,
    pub ou: String,
    pub description: String,
    pub email: String,
    pub kind: PrincipalKind,
    pub deleted_by: PrincipalId,
    pub deleted_date: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub publish_tag: PublishTag,
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner_id: PrincipalId,
    pub user_group_id: PrincipalId,
    pub manager_group_id: PrincipalId,
    pub date_created: i64,
    pub published_by: PrincipalId,
    pub publish_date: i64,
    pub paths: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitEntry {
    pub user_id: PrincipalId,
    pub structure_id: StructureId,
    pub date_visited: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub principal_id: PrincipalId,
    pub structure_id: StructureId,
    /// 0 while active.
    pub date_deleted: i64,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.date_deleted == 0
    }
}
