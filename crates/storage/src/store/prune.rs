#![forbid(unsafe_code)]

use super::support::{Query, execute, id_at, query_opt, query_rows, query_scalar};
use super::{HistoryTx, SqliteHistoryStore, StoreError};
use hist_core::history::{
    HistoricalResource, PublishTag, ResourceCutoff, RetentionPolicy, newest_version,
};
use hist_core::ids::StructureId;
use rusqlite::params;
use tracing::{debug, instrument};

impl HistoryTx<'_> {
    /// Removes history of `resource` beyond `policy` and returns the number of versions removed.
    ///
    /// Resource rows and contents survive while any structure row (of any sibling) still
    /// resolves to them. A folder left without history takes its historical children with it.
    #[instrument(
        name = "history::delete_entries",
        level = "debug",
        skip(self, resource),
        fields(structure_id = %resource.structure_id)
    )]
    pub fn delete_entries(
        &self,
        resource: &HistoricalResource,
        policy: RetentionPolicy,
    ) -> Result<usize, StoreError> {
        let removed = self.prune_versions(resource, policy)?;
        self.purge_empty_folder(resource)?;
        Ok(removed)
    }

    fn prune_versions(
        &self,
        resource: &HistoricalResource,
        policy: RetentionPolicy,
    ) -> Result<usize, StoreError> {
        let structure_id = resource.structure_id.to_string();

        let Some(max_version) = query_scalar::<i32, _>(
            self.conn,
            Query::MaxStructureVersion,
            params![structure_id],
        )?
        else {
            return Ok(0);
        };

        let max_version_by_time = match policy.cutoff() {
            Some(cutoff) => query_scalar::<i32, _>(
                self.conn,
                Query::MaxStructureVersionByDate,
                params![structure_id, cutoff],
            )?,
            None => None,
        };

        let Some(up_to) = policy.deletable_up_to(max_version, max_version_by_time) else {
            return Ok(0);
        };

        let Some(boundary) = query_scalar::<PublishTag, _>(
            self.conn,
            Query::StructureTagUpToVersion,
            params![structure_id, up_to],
        )?
        else {
            return Ok(0);
        };
        let min_structure_tag = boundary + 1;

        execute(
            self.conn,
            Query::DeleteStructureProperties,
            params![structure_id, min_structure_tag],
        )?;
        let structure_rows = execute(
            self.conn,
            Query::DeleteStructureRows,
            params![structure_id, min_structure_tag],
        )?;

        let resource_id = resource.resource_id.to_string();
        let (referencing_rows, min_referenced) = query_opt(
            self.conn,
            Query::ResourceReferences,
            params![resource_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<PublishTag>>(1)?)),
        )?
        .unwrap_or((0, None));
        let cutoff = ResourceCutoff::from_references(referencing_rows, min_referenced);
        let bound = cutoff.as_exclusive_bound();

        let resource_rows = execute(
            self.conn,
            Query::DeleteResourceRows,
            params![resource_id, bound],
        )?;
        let contents = execute(self.conn, Query::DeleteContents, params![resource_id, bound])?;

        debug!(
            max_version,
            up_to,
            min_structure_tag,
            structure_rows,
            resource_rows,
            contents,
            "history pruned"
        );

        Ok(match cutoff {
            ResourceCutoff::Everything => structure_rows,
            ResourceCutoff::Below(_) => structure_rows.max(resource_rows),
        })
    }

    fn purge_empty_folder(&self, resource: &HistoricalResource) -> Result<(), StoreError> {
        if !resource.is_folder() || self.read_last_version(resource.structure_id)? > 0 {
            return Ok(());
        }

        let children = query_rows(
            self.conn,
            Query::StructureChildren,
            params![resource.structure_id.to_string()],
            |row| id_at::<StructureId>(row, 0),
        )?;
        for child in children {
            if child == resource.structure_id {
                continue;
            }
            match newest_version(self, child)? {
                Some(newest) => {
                    self.delete_entries(&newest, RetentionPolicy::purge())?;
                }
                None => self.drop_structure_rows(child)?,
            }
        }
        Ok(())
    }

    /// Removes structure and property rows that no resource snapshot backs.
    fn drop_structure_rows(&self, structure_id: StructureId) -> Result<(), StoreError> {
        let key = structure_id.to_string();
        execute(
            self.conn,
            Query::DeleteStructureProperties,
            params![key, PublishTag::MAX],
        )?;
        let rows = execute(
            self.conn,
            Query::DeleteStructureRows,
            params![key, PublishTag::MAX],
        )?;
        debug!(%structure_id, rows, "orphaned structure rows dropped");
        Ok(())
    }
}

impl SqliteHistoryStore {
    pub fn delete_entries(
        &mut self,
        resource: &HistoricalResource,
        policy: RetentionPolicy,
    ) -> Result<usize, StoreError> {
        self.in_transaction(|tx| tx.delete_entries(resource, policy))
    }
}
