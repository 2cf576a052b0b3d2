#![forbid(unsafe_code)]

use super::support::{Query, execute, query_scalar};
use super::{HistoryTx, LiveResource, SqliteHistoryStore, StoreError};
use hist_core::history::{Property, PublishTag};
use hist_core::ids::StructureId;
use rusqlite::params;
use tracing::{debug, instrument};

impl HistoryTx<'_> {
    /// Archives `resource` as published under `publish_tag`.
    ///
    /// Siblings published in the same event share one resource row; the structure row and
    /// the properties are written for every call.
    #[instrument(
        name = "history::write_resource",
        level = "debug",
        skip(self, resource, properties),
        fields(structure_id = %resource.structure_id, path = %resource.path)
    )]
    pub fn write_resource(
        &self,
        resource: &LiveResource,
        properties: &[Property],
        publish_tag: PublishTag,
    ) -> Result<(), StoreError> {
        if publish_tag <= 0 {
            return Err(StoreError::InvalidInput("publish tag must be positive"));
        }

        let counters = self
            .live
            .read_version_counters(resource.resource_id, resource.structure_id)?;
        let resource_id = resource.resource_id.to_string();
        let structure_id = resource.structure_id.to_string();

        let resource_rows = query_scalar::<i64, _>(
            self.conn,
            Query::ResourceRowExists,
            params![resource_id, publish_tag],
        )?
        .unwrap_or(0);
        if resource_rows == 0 {
            execute(
                self.conn,
                Query::InsertResource,
                params![
                    resource_id,
                    resource.type_id,
                    resource.flags,
                    resource.size,
                    resource.date_content,
                    resource.date_created,
                    resource.user_created.to_string(),
                    resource.date_last_modified,
                    resource.user_last_modified.to_string(),
                    resource.state.code(),
                    resource.sibling_count,
                    counters.resource_version,
                    publish_tag,
                ],
            )?;
        }

        if !resource.is_folder()
            && let Some(content) = resource.content.as_deref()
        {
            let keep_permanently = resource.state.is_deleted() && resource.sibling_count < 2;
            execute(
                self.conn,
                Query::InsertContent,
                params![resource_id, publish_tag, content, keep_permanently],
            )?;
        }

        let parent_id = self
            .live
            .read_parent_folder(resource.structure_id)?
            .map_or_else(StructureId::nil, |parent| parent.structure_id);
        execute(
            self.conn,
            Query::InsertStructure,
            params![
                structure_id,
                resource_id,
                resource.path,
                parent_id.to_string(),
                resource.date_released,
                resource.date_expired,
                resource.state.code(),
                counters.structure_version,
                publish_tag,
            ],
        )?;

        self.write_properties(resource, properties, publish_tag)?;

        debug!(
            publish_tag,
            structure_version = counters.structure_version,
            resource_version = counters.resource_version,
            shared_resource_row = resource_rows > 0,
            "resource archived"
        );
        Ok(())
    }
}

impl SqliteHistoryStore {
    pub fn write_resource(
        &mut self,
        resource: &LiveResource,
        properties: &[Property],
        publish_tag: PublishTag,
    ) -> Result<(), StoreError> {
        self.in_transaction(|tx| tx.write_resource(resource, properties, publish_tag))
    }
}
