#![forbid(unsafe_code)]

use super::support::{
    DIRECT_RESOURCE_OFFSET, Query, id_at, query_opt, query_rows, query_scalar, resource_at,
    structure_at,
};
use super::{DeletedResourcesRequest, HistoryTx, SqliteHistoryStore, StoreError};
use hist_core::history::{
    DirectVersion, HistoricalResource, PublishTag, ResourceSnapshot, SnapshotSource,
    newest_version, reconstruct_versions,
};
use hist_core::ids::{ResourceId, StructureId};
use rusqlite::params;
use std::collections::BTreeSet;
use tracing::{instrument, warn};

impl SnapshotSource for HistoryTx<'_> {
    type Error = StoreError;

    fn direct_versions(&self, structure_id: StructureId) -> Result<Vec<DirectVersion>, StoreError> {
        let rows = query_rows(
            self.conn,
            Query::DirectVersions,
            params![structure_id.to_string()],
            |row| {
                let structure = structure_at(row)?;
                let resource = match row.get::<_, Option<String>>(DIRECT_RESOURCE_OFFSET)? {
                    Some(_) => Some(resource_at(row, DIRECT_RESOURCE_OFFSET)?),
                    None => None,
                };
                Ok((structure, resource))
            },
        )?;

        let mut out = Vec::with_capacity(rows.len());
        for (structure, resource) in rows {
            match resource {
                Some(resource) => out.push(DirectVersion {
                    structure,
                    resource,
                }),
                None => warn!(
                    structure_id = %structure.structure_id,
                    publish_tag = structure.publish_tag,
                    "structure snapshot has no resource snapshot at or before its tag"
                ),
            }
        }
        Ok(out)
    }

    fn resources_after(
        &self,
        resource_id: ResourceId,
        tag: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, StoreError> {
        query_rows(
            self.conn,
            Query::ResourcesAfter,
            params![resource_id.to_string(), tag],
            |row| resource_at(row, 0),
        )
    }

    fn resources_between(
        &self,
        resource_id: ResourceId,
        lower: PublishTag,
        upper: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, StoreError> {
        query_rows(
            self.conn,
            Query::ResourcesBetween,
            params![resource_id.to_string(), lower, upper],
            |row| resource_at(row, 0),
        )
    }

    fn resources_before(
        &self,
        resource_id: ResourceId,
        tag: PublishTag,
    ) -> Result<Vec<ResourceSnapshot>, StoreError> {
        query_rows(
            self.conn,
            Query::ResourcesBefore,
            params![resource_id.to_string(), tag],
            |row| resource_at(row, 0),
        )
    }
}

impl HistoryTx<'_> {
    /// All versions of `structure_id`, newest publish tag first. Empty when nothing is recorded.
    #[instrument(name = "history::read_all_available_versions", level = "debug", skip(self))]
    pub fn read_all_available_versions(
        &self,
        structure_id: StructureId,
    ) -> Result<Vec<HistoricalResource>, StoreError> {
        reconstruct_versions(self, structure_id)
    }

    #[instrument(name = "history::read_resource", level = "debug", skip(self))]
    pub fn read_resource(
        &self,
        structure_id: StructureId,
        version: i32,
    ) -> Result<HistoricalResource, StoreError> {
        self.read_all_available_versions(structure_id)?
            .into_iter()
            .find(|resource| resource.version == version)
            .ok_or_else(|| {
                StoreError::not_found("historical resource", format!("{structure_id}@{version}"))
            })
    }

    #[instrument(name = "history::read_last_version", level = "trace", skip(self))]
    pub fn read_last_version(&self, structure_id: StructureId) -> Result<i32, StoreError> {
        let version = query_scalar::<i32, _>(
            self.conn,
            Query::LastVersion,
            params![structure_id.to_string()],
        )?;
        Ok(version.unwrap_or(0))
    }

    #[instrument(name = "history::read_max_publish_tag", level = "trace", skip(self))]
    pub fn read_max_publish_tag(&self, resource_id: ResourceId) -> Result<PublishTag, StoreError> {
        let tag = query_scalar::<PublishTag, _>(
            self.conn,
            Query::MaxPublishTag,
            params![resource_id.to_string()],
        )?;
        Ok(tag.unwrap_or(0))
    }

    #[instrument(name = "history::read_next_publish_tag", level = "trace", skip(self))]
    pub fn read_next_publish_tag(&self) -> Result<PublishTag, StoreError> {
        let max = query_scalar::<PublishTag, _>(self.conn, Query::NextPublishTag, [])?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Tag of the newest publish event at or before `max_date`; 0 if there is none.
    #[instrument(name = "history::read_publish_tag", level = "trace", skip(self))]
    pub fn read_publish_tag(&self, max_date: i64) -> Result<PublishTag, StoreError> {
        let tag = query_scalar::<PublishTag, _>(self.conn, Query::PublishTagAtDate, params![max_date])?;
        Ok(tag.unwrap_or(0))
    }

    /// Content of `resource_id` as archived at or before `publish_tag`.
    #[instrument(name = "history::read_content", level = "trace", skip(self))]
    pub fn read_content(
        &self,
        resource_id: ResourceId,
        publish_tag: PublishTag,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        query_opt(
            self.conn,
            Query::ReadContent,
            params![resource_id.to_string(), publish_tag],
            |row| row.get::<_, Vec<u8>>(0),
        )
    }

    /// Newest version of every history entry that no longer exists in the live tree.
    ///
    /// With a path hint, entries recorded under that path prefix are included as well, since
    /// the recorded parent of an entry may itself be gone or moved.
    #[instrument(name = "history::read_deleted_resources", level = "debug", skip(self))]
    pub fn read_deleted_resources(
        &self,
        request: &DeletedResourcesRequest,
    ) -> Result<Vec<HistoricalResource>, StoreError> {
        let parent = request.parent_id.map(|id| id.to_string());
        let mut candidates: BTreeSet<StructureId> = query_rows(
            self.conn,
            Query::HistoryStructureIds,
            params![parent],
            |row| id_at::<StructureId>(row, 0),
        )?
        .into_iter()
        .collect();

        if let Some(hint) = request.path_hint.as_deref() {
            candidates.extend(query_rows(
                self.conn,
                Query::HistoryStructureIdsByPath,
                params![hint],
                |row| id_at::<StructureId>(row, 0),
            )?);
        }

        let mut out = Vec::new();
        for structure_id in candidates {
            if self.live.exists_in_live_tree(structure_id)? {
                continue;
            }
            let Some(newest) = newest_version(self, structure_id)? else {
                continue;
            };
            if request
                .user_id
                .is_some_and(|user| newest.user_last_modified != user)
            {
                continue;
            }
            out.push(newest);
        }

        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}

impl SqliteHistoryStore {
    pub fn read_all_available_versions(
        &mut self,
        structure_id: StructureId,
    ) -> Result<Vec<HistoricalResource>, StoreError> {
        self.in_transaction(|tx| tx.read_all_available_versions(structure_id))
    }

    pub fn read_resource(
        &mut self,
        structure_id: StructureId,
        version: i32,
    ) -> Result<HistoricalResource, StoreError> {
        self.in_transaction(|tx| tx.read_resource(structure_id, version))
    }

    pub fn read_last_version(&mut self, structure_id: StructureId) -> Result<i32, StoreError> {
        self.in_transaction(|tx| tx.read_last_version(structure_id))
    }

    pub fn read_max_publish_tag(&mut self, resource_id: ResourceId) -> Result<PublishTag, StoreError> {
        self.in_transaction(|tx| tx.read_max_publish_tag(resource_id))
    }

    pub fn read_next_publish_tag(&mut self) -> Result<PublishTag, StoreError> {
        self.in_transaction(|tx| tx.read_next_publish_tag())
    }

    pub fn read_publish_tag(&mut self, max_date: i64) -> Result<PublishTag, StoreError> {
        self.in_transaction(|tx| tx.read_publish_tag(max_date))
    }

    pub fn read_content(
        &mut self,
        resource_id: ResourceId,
        publish_tag: PublishTag,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.in_transaction(|tx| tx.read_content(resource_id, publish_tag))
    }

    pub fn read_deleted_resources(
        &mut self,
        request: &DeletedResourcesRequest,
    ) -> Result<Vec<HistoricalResource>, StoreError> {
        self.in_transaction(|tx| tx.read_deleted_resources(request))
    }
}
