#![forbid(unsafe_code)]

use super::types::{DirectVersion, HistoricalResource, ResourceKind, ResourceSnapshot, StructureSnapshot};

/// Structure fields come from `context`, content fields from `resource`.
///
/// `structure_version_offset` is subtracted from the context's structure version; it is 1 for
/// resource snapshots that predate the structure entry and 0 otherwise. The result carries the
/// resource snapshot's publish tag.
pub fn merge_snapshots(
    context: &StructureSnapshot,
    resource: &ResourceSnapshot,
    structure_version_offset: i32,
) -> HistoricalResource {
    let structure_version = context.structure_version - structure_version_offset;
    HistoricalResource {
        kind: ResourceKind::from_path(&context.path),
        publish_tag: resource.publish_tag,
        structure_id: context.structure_id,
        resource_id: resource.resource_id,
        path: context.path.clone(),
        parent_id: context.parent_id,
        type_id: resource.type_id,
        flags: resource.flags,
        state: resource.state.max(context.state),
        date_created: resource.date_created,
        user_created: resource.user_created,
        date_last_modified: resource.date_last_modified,
        user_last_modified: resource.user_last_modified,
        date_released: context.date_released,
        date_expired: context.date_expired,
        date_content: resource.date_content,
        size: resource.size,
        sibling_count: resource.sibling_count,
        version: resource.resource_version + structure_version,
        resource_version: resource.resource_version,
        structure_version,
    }
}

impl DirectVersion {
    /// The structure snapshot itself, stamped with its own publish tag.
    pub fn to_historical(&self) -> HistoricalResource {
        let mut merged = merge_snapshots(&self.structure, &self.resource, 0);
        merged.publish_tag = self.structure.publish_tag;
        merged
    }

    pub fn version(&self) -> i32 {
        self.resource.resource_version + self.structure.structure_version
    }
}
