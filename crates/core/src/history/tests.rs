use super::*;
use crate::ids::{PrincipalId, ResourceId, StructureId};
use std::convert::Infallible;

#[derive(Default)]
struct MemorySource {
    structures: Vec<StructureSnapshot>,
    resources: Vec<ResourceSnapshot>,
}

impl MemorySource {
    fn structure(&mut self, structure_id: StructureId, resource_id: ResourceId, path: &str, version: i32, tag: PublishTag) {
        self.structures.push(StructureSnapshot {
            structure_id,
            resource_id,
            path: path.to_string(),
            parent_id: StructureId::nil(),
            date_released: 0,
            date_expired: i64::MAX,
            state: ResourceState::Unchanged,
            structure_version: version,
            publish_tag: tag,
        });
    }

    fn resource(&mut self, resource_id: ResourceId, version: i32, tag: PublishTag) {
        self.resources.push(ResourceSnapshot {
            resource_id,
            type_id: 1,
            flags: 0,
            size: i64::from(version) * 10,
            date_content: tag * 1_000,
            date_created: 1_000,
            user_created: PrincipalId::nil(),
            date_last_modified: tag * 1_000,
            user_last_modified: PrincipalId::nil(),
            state: ResourceState::Changed,
            sibling_count: 1,
            resource_version: version,
            publish_tag: tag,
        });
    }

    fn sorted_resources(&self, resource_id: ResourceId, keep: impl Fn(PublishTag) -> bool) -> Vec<ResourceSnapshot> {
        let mut out: Vec<_> = self
            .resources
            .iter()
            .filter(|r| r.resource_id == resource_id && keep(r.publish_tag))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.publish_tag);
        out
    }
}

impl SnapshotSource for MemorySource {
    type Error = Infallible;

    fn direct_versions(&self, structure_id: StructureId) -> Result<Vec<DirectVersion>, Infallible> {
        let mut structures: Vec<_> = self
            .structures
            .iter()
            .filter(|s| s.structure_id == structure_id)
            .cloned()
            .collect();
        structures.sort_by_key(|s| std::cmp::Reverse(s.publish_tag));
        Ok(structures
            .into_iter()
            .filter_map(|structure| {
                let resource = self
                    .sorted_resources(structure.resource_id, |tag| tag <= structure.publish_tag)
                    .pop()?;
                Some(DirectVersion { structure, resource })
            })
            .collect())
    }

    fn resources_after(&self, resource_id: ResourceId, tag: PublishTag) -> Result<Vec<ResourceSnapshot>, Infallible> {
        Ok(self.sorted_resources(resource_id, |t| t > tag))
    }

    fn resources_between(
        &self,
        resource_id: ResourceId,
        lower: PublishTag,
        upper: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, Infallible> {
        Ok(self.sorted_resources(resource_id, |t| t > lower && t < upper))
    }

    fn resources_before(&self, resource_id: ResourceId, tag: PublishTag) -> Result<Vec<ResourceSnapshot>, Infallible> {
        let mut out = self.sorted_resources(resource_id, |t| t < tag);
        out.reverse();
        Ok(out)
    }
}

fn summary(versions: &[HistoricalResource]) -> Vec<(PublishTag, i32, &str)> {
    versions
        .iter()
        .map(|v| (v.publish_tag, v.version, v.path.as_str()))
        .collect()
}

fn assert_well_ordered(versions: &[HistoricalResource]) {
    for pair in versions.windows(2) {
        assert!(pair[0].publish_tag > pair[1].publish_tag, "tags must strictly descend");
        assert_ne!(
            (pair[0].resource_version, pair[0].structure_version),
            (pair[1].resource_version, pair[1].structure_version)
        );
    }
}

#[test]
fn content_change_between_structure_snapshots_is_interpolated() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    source.structure(structure_id, resource_id, "/sites/a.txt", 1, 10);
    source.resource(resource_id, 1, 10);
    source.resource(resource_id, 2, 20);
    source.structure(structure_id, resource_id, "/sites/b.txt", 2, 30);

    let versions = reconstruct_versions(&source, structure_id).unwrap();
    assert_eq!(
        summary(&versions),
        vec![(30, 4, "/sites/b.txt"), (20, 3, "/sites/a.txt"), (10, 2, "/sites/a.txt")]
    );
    assert_eq!(versions[1].size, 20);
    assert_eq!(versions[1].structure_version, 1);
    assert_eq!(versions[1].resource_version, 2);
    assert_well_ordered(&versions);
}

#[test]
fn unknown_structure_yields_no_versions() {
    let source = MemorySource::default();
    let versions = reconstruct_versions(&source, StructureId::new()).unwrap();
    assert!(versions.is_empty());
}

#[test]
fn sibling_changes_after_newest_snapshot_are_prepended() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    source.structure(structure_id, resource_id, "/a.txt", 1, 10);
    source.resource(resource_id, 1, 10);
    source.resource(resource_id, 1, 15);
    source.resource(resource_id, 2, 20);
    source.resource(resource_id, 3, 25);

    let versions = reconstruct_versions(&source, structure_id).unwrap();
    assert_eq!(
        summary(&versions),
        vec![(25, 4, "/a.txt"), (20, 3, "/a.txt"), (10, 2, "/a.txt")]
    );
    assert_well_ordered(&versions);
}

#[test]
fn newest_version_matches_full_reconstruction() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    assert_eq!(newest_version(&source, structure_id).unwrap(), None);

    source.structure(structure_id, resource_id, "/a.txt", 1, 10);
    source.resource(resource_id, 1, 10);
    let only = newest_version(&source, structure_id).unwrap().expect("direct version");
    assert_eq!((only.publish_tag, only.version), (10, 2));

    source.resource(resource_id, 2, 20);
    source.resource(resource_id, 2, 30);
    let newest = newest_version(&source, structure_id).unwrap();
    let full = reconstruct_versions(&source, structure_id).unwrap();
    assert_eq!(newest.as_ref(), full.first());
    assert_eq!(newest.map(|v| v.publish_tag), Some(20));
}

#[test]
fn resource_history_before_structure_entry_uses_offset() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    source.resource(resource_id, 1, 10);
    source.resource(resource_id, 2, 20);
    source.resource(resource_id, 3, 40);
    source.structure(structure_id, resource_id, "/copy.txt", 1, 50);

    let versions = reconstruct_versions(&source, structure_id).unwrap();
    assert_eq!(
        summary(&versions),
        vec![(50, 4, "/copy.txt"), (20, 2, "/copy.txt"), (10, 1, "/copy.txt")]
    );
    assert!(versions[1..].iter().all(|v| v.structure_version == 0));
    assert_well_ordered(&versions);
}

#[test]
fn state_is_the_stronger_of_both_signals() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    source.structure(structure_id, resource_id, "/gone/", 1, 10);
    source.structures[0].state = ResourceState::Deleted;
    source.resource(resource_id, 1, 10);

    let versions = reconstruct_versions(&source, structure_id).unwrap();
    assert_eq!(versions[0].state, ResourceState::Deleted);
    assert!(versions[0].is_folder());
}

#[test]
fn historical_kind_serializes_as_tag() {
    let structure_id = StructureId::new();
    let resource_id = ResourceId::new();
    let mut source = MemorySource::default();
    source.structure(structure_id, resource_id, "/folder/", 1, 10);
    source.resource(resource_id, 1, 10);

    let versions = reconstruct_versions(&source, structure_id).unwrap();
    let json = serde_json::to_value(&versions[0]).unwrap();
    assert_eq!(json["kind"], "folder");
    assert_eq!(json["structure_id"], structure_id.to_string());
}

#[test]
fn retention_keep_last_bounds() {
    assert_eq!(RetentionPolicy::keep_last(1).deletable_up_to(5, None), Some(4));
    assert_eq!(RetentionPolicy::keep_last(5).deletable_up_to(5, None), None);
    assert_eq!(RetentionPolicy::keep_last(7).deletable_up_to(5, None), None);
    assert_eq!(RetentionPolicy::purge().deletable_up_to(3, None), Some(3));
}

#[test]
fn retention_negative_keep_is_unbounded_until_cutoff() {
    let policy = RetentionPolicy::new(-1, 1_000);
    assert_eq!(policy.deletable_up_to(5, None), None);
    assert_eq!(policy.deletable_up_to(5, Some(0)), None);
    assert_eq!(policy.deletable_up_to(5, Some(3)), Some(3));
}

#[test]
fn retention_count_and_cutoff_take_the_stricter_bound() {
    // keep 3 by count, keep 1 by time: the time bound deletes more
    assert_eq!(RetentionPolicy::new(3, 0).deletable_up_to(5, Some(4)), Some(4));
    // keep 1 by count, keep 3 by time: the count bound deletes more
    assert_eq!(RetentionPolicy::new(1, 0).deletable_up_to(5, Some(2)), Some(4));
    assert_eq!(RetentionPolicy::new(2, -1).cutoff(), None);
    assert_eq!(RetentionPolicy::new(2, 0).cutoff(), Some(0));
}

#[test]
fn resource_cutoff_without_references_clears_everything() {
    assert_eq!(
        ResourceCutoff::from_references(0, None).as_exclusive_bound(),
        PublishTag::MAX
    );
    assert_eq!(ResourceCutoff::from_references(2, Some(7)), ResourceCutoff::Below(7));
    // referenced, but nothing resolvable: keep every row
    assert_eq!(
        ResourceCutoff::from_references(1, None).as_exclusive_bound(),
        PublishTag::MIN
    );
}

fn value(name: &str, mapping_type: MappingType, value: &str) -> PropertyValue {
    PropertyValue {
        name: name.to_string(),
        mapping_type,
        value: value.to_string(),
    }
}

#[test]
fn structure_only_property_leaves_resource_value_empty() {
    let merged = merge_property_values([value("Title", MappingType::Structure, "Home")]).unwrap();
    let title = &merged["Title"];
    assert_eq!(title.structure_value.as_deref(), Some("Home"));
    assert_eq!(title.resource_value, None);
    assert_eq!(title.value(), Some("Home"));
}

#[test]
fn duplicate_mapping_type_is_a_consistency_error() {
    let err = merge_property_values([
        value("Title", MappingType::Resource, "a"),
        value("Title", MappingType::Structure, "b"),
        value("Title", MappingType::Resource, "c"),
    ])
    .unwrap_err();
    assert!(matches!(err, HistoryError::DataConsistency(_)));
}

#[test]
fn overlay_keeps_structure_values() {
    let mut base = merge_property_values([
        value("Title", MappingType::Structure, "Home"),
        value("Title", MappingType::Resource, "old"),
    ])
    .unwrap();
    let newer = merge_property_values([
        value("Title", MappingType::Resource, "new"),
        value("Keywords", MappingType::Resource, "cms"),
    ])
    .unwrap();
    overlay_properties(&mut base, newer);

    assert_eq!(base["Title"].structure_value.as_deref(), Some("Home"));
    assert_eq!(base["Title"].resource_value.as_deref(), Some("new"));
    assert_eq!(base["Keywords"].value(), Some("cms"));
}

#[test]
fn parent_folder_keeps_separator() {
    use crate::paths::parent_folder;
    assert_eq!(parent_folder("/sites/a.txt"), Some("/sites/"));
    assert_eq!(parent_folder("/sites/news/"), Some("/sites/"));
    assert_eq!(parent_folder("/"), None);
}
