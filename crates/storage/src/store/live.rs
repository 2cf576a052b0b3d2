#![forbid(unsafe_code)]

use super::StoreError;
use hist_core::history::ResourceState;
use hist_core::ids::{PrincipalId, ResourceId, StructureId};

/// A resource of the live (online) tree, as handed to the write path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveResource {
    pub structure_id: StructureId,
    pub resource_id: ResourceId,
    pub path: String,
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
    /// File content; `None` for folders.
    pub content: Option<Vec<u8>>,
}

impl LiveResource {
    pub fn is_folder(&self) -> bool {
        hist_core::paths::is_folder_path(&self.path)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionCounters {
    pub structure_version: i32,
    pub resource_version: i32,
}

/// Lookups into the live tree that the history driver depends on.
pub trait LiveTree {
    fn exists_in_live_tree(&self, structure_id: StructureId) -> Result<bool, StoreError>;

    fn read_parent_folder(&self, structure_id: StructureId)
    -> Result<Option<LiveResource>, StoreError>;

    fn read_resource(&self, path: &str) -> Result<Option<LiveResource>, StoreError>;

    fn read_version_counters(
        &self,
        resource_id: ResourceId,
        structure_id: StructureId,
    ) -> Result<VersionCounters, StoreError>;
}
