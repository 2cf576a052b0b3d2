#![forbid(unsafe_code)]

use super::types::PublishTag;
use serde::{Deserialize, Serialize};

/// How much history of one structure entry survives a pruning pass.
///
/// A negative `versions_to_keep` keeps everything unless the cutoff narrows it.
/// A negative `cutoff_time` disables the time bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub versions_to_keep: i32,
    pub cutoff_time: i64,
}

impl RetentionPolicy {
    pub fn new(versions_to_keep: i32, cutoff_time: i64) -> Self {
        Self {
            versions_to_keep,
            cutoff_time,
        }
    }

    pub fn keep_last(versions_to_keep: i32) -> Self {
        Self::new(versions_to_keep, -1)
    }

    /// Drops every version.
    pub fn purge() -> Self {
        Self::new(0, -1)
    }

    pub fn cutoff(&self) -> Option<i64> {
        (self.cutoff_time >= 0).then_some(self.cutoff_time)
    }

    /// Highest structure version that may be deleted, or `None` when nothing is deletable.
    ///
    /// `max_version_by_time` is the highest structure version published at or before the
    /// cutoff; values below 1 mean no version qualified and the time bound is ignored.
    pub fn deletable_up_to(&self, max_version: i32, max_version_by_time: Option<i32>) -> Option<i32> {
        let mut keep = (self.versions_to_keep >= 0).then_some(self.versions_to_keep);
        if let Some(by_time) = max_version_by_time.filter(|version| *version > 0) {
            let keep_by_time = max_version - by_time;
            keep = Some(keep.map_or(keep_by_time, |count| count.min(keep_by_time)));
        }
        let up_to = max_version - keep?;
        (up_to > 0).then_some(up_to)
    }
}

/// Lower bound for resource and content rows of one resource id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceCutoff {
    /// Rows tagged strictly below the tag go.
    Below(PublishTag),
    /// No structure entry references the resource any more.
    Everything,
}

impl ResourceCutoff {
    /// `referencing_rows` counts structure snapshots (of any sibling) still pointing at the
    /// resource; `min_referenced` is the oldest resource tag those snapshots resolve to.
    pub fn from_references(referencing_rows: i64, min_referenced: Option<PublishTag>) -> Self {
        if referencing_rows == 0 {
            return Self::Everything;
        }
        Self::Below(min_referenced.unwrap_or(PublishTag::MIN))
    }

    pub fn as_exclusive_bound(self) -> PublishTag {
        match self {
            Self::Below(tag) => tag,
            Self::Everything => PublishTag::MAX,
        }
    }
}
