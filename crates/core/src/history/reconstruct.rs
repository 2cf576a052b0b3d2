#![forbid(unsafe_code)]

use super::merge::merge_snapshots;
use super::types::{DirectVersion, HistoricalResource, PublishTag, ResourceSnapshot};
use crate::ids::{ResourceId, StructureId};

/// Read side of the snapshot tables, as needed by [`reconstruct_versions`].
///
/// All reads are expected to observe one consistent snapshot of the store.
pub trait SnapshotSource {
    type Error;

    /// Structure snapshots of `structure_id` joined with their owning resource snapshot,
    /// newest publish tag first.
    fn direct_versions(&self, structure_id: StructureId) -> Result<Vec<DirectVersion>, Self::Error>;

    /// Resource snapshots with a publish tag greater than `tag`, ascending.
    fn resources_after(
        &self,
        resource_id: ResourceId,
        tag: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, Self::Error>;

    /// Resource snapshots with `lower < tag < upper`, ascending.
    fn resources_between(
        &self,
        resource_id: ResourceId,
        lower: PublishTag,
        upper: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, Self::Error>;

    /// Resource snapshots with a publish tag less than `tag`, descending.
    fn resources_before(
        &self,
        resource_id: ResourceId,
        tag: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, Self::Error>;
}

/// Every distinguishable version of `structure_id`, newest publish tag first.
///
/// Direct versions (structure snapshots) are interleaved with resource-only changes made
/// through siblings: changes after the newest structure snapshot, changes between two
/// structure snapshots (seen through the older one) and changes before the oldest one.
/// A resource snapshot whose version equals the last one considered adds nothing and is skipped.
pub fn reconstruct_versions<S>(
    source: &S,
    structure_id: StructureId,
) -> Result<Vec<HistoricalResource>, S::Error>
where
    S: SnapshotSource + ?Sized,
{
    let direct = source.direct_versions(structure_id)?;
    let Some(newest) = direct.first() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();

    let newer = source.resources_after(newest.structure.resource_id, newest.structure.publish_tag)?;
    let mut interpolated = interpolate(newest, newer, 0);
    interpolated.reverse();
    out.append(&mut interpolated);

    for (index, current) in direct.iter().enumerate() {
        out.push(current.to_historical());

        let Some(older) = direct.get(index + 1) else {
            break;
        };
        let between = source.resources_between(
            older.structure.resource_id,
            older.structure.publish_tag,
            current.structure.publish_tag,
        )?;
        let mut interpolated = interpolate(older, between, 0);
        interpolated.reverse();
        out.append(&mut interpolated);
    }

    if let Some(oldest) = direct.last() {
        if oldest.version() > 1 {
            let older =
                source.resources_before(oldest.structure.resource_id, oldest.structure.publish_tag)?;
            out.append(&mut interpolate(oldest, older, 1));
        }
    }

    Ok(out)
}

/// The newest entry [`reconstruct_versions`] would return, without walking older history.
pub fn newest_version<S>(
    source: &S,
    structure_id: StructureId,
) -> Result<Option<HistoricalResource>, S::Error>
where
    S: SnapshotSource + ?Sized,
{
    let direct = source.direct_versions(structure_id)?;
    let Some(newest) = direct.into_iter().next() else {
        return Ok(None);
    };

    let newer = source.resources_after(newest.structure.resource_id, newest.structure.publish_tag)?;
    Ok(interpolate(&newest, newer, 0)
        .pop()
        .or_else(|| Some(newest.to_historical())))
}

/// Merges `snapshots` (in the order given) against `context`, dropping unchanged versions.
fn interpolate(
    context: &DirectVersion,
    snapshots: Vec<ResourceSnapshot>,
    structure_version_offset: i32,
) -> Vec<HistoricalResource> {
    let mut last_version = context.resource.resource_version;
    let mut out = Vec::new();
    for snapshot in snapshots {
        if snapshot.resource_version == last_version {
            continue;
        }
        last_version = snapshot.resource_version;
        out.push(merge_snapshots(
            &context.structure,
            &snapshot,
            structure_version_offset,
        ));
    }
    out
}
