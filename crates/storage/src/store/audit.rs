#![forbid(unsafe_code)]

use super::support::{Query, execute, id_at, query_opt, query_rows, query_scalar};
use super::{HistoryTx, SqliteHistoryStore, StoreError, WriteProjectRequest};
use hist_core::history::{PrincipalKind, PrincipalSnapshot, PublishRecord, PublishTag};
use hist_core::ids::PrincipalId;
use rusqlite::types::Type;
use rusqlite::{Row, params};
use tracing::{debug, instrument};

impl HistoryTx<'_> {
    /// Archives a deleted principal once; returns `false` when it was already archived.
    #[instrument(
        name = "history::write_principal",
        level = "debug",
        skip(self, principal),
        fields(principal_id = %principal.principal_id)
    )]
    pub fn write_principal(&self, principal: &PrincipalSnapshot) -> Result<bool, StoreError> {
        let principal_id = principal.principal_id.to_string();
        let existing =
            query_scalar::<i64, _>(self.conn, Query::PrincipalExists, params![principal_id])?
                .unwrap_or(0);
        if existing > 0 {
            return Ok(false);
        }

        execute(
            self.conn,
            Query::InsertPrincipal,
            params![
                principal_id,
                principal.name,
                principal.ou,
                principal.description,
                principal.email,
                principal.kind.as_str(),
                principal.deleted_by.to_string(),
                principal.deleted_date,
            ],
        )?;
        Ok(true)
    }

    #[instrument(name = "history::read_principal", level = "trace", skip(self))]
    pub fn read_principal(&self, principal_id: PrincipalId) -> Result<PrincipalSnapshot, StoreError> {
        query_opt(
            self.conn,
            Query::ReadPrincipal,
            params![principal_id.to_string()],
            principal_at,
        )?
        .ok_or_else(|| StoreError::not_found("principal", principal_id))
    }

    /// Records one publish event and the paths it published.
    #[instrument(
        name = "history::write_project",
        level = "debug",
        skip(self, request),
        fields(publish_tag = request.publish_tag)
    )]
    pub fn write_project(&self, request: &WriteProjectRequest) -> Result<PublishRecord, StoreError> {
        let project = &request.project;
        execute(
            self.conn,
            Query::InsertProject,
            params![
                request.publish_tag,
                project.project_id.to_string(),
                project.name,
                project.description,
                project.owner_id.to_string(),
                project.user_group_id.to_string(),
                project.manager_group_id.to_string(),
                project.date_created,
                request.published_by.to_string(),
                request.publish_date,
            ],
        )?;
        for path in &request.paths {
            execute(
                self.conn,
                Query::InsertProjectResource,
                params![request.publish_tag, path],
            )?;
        }
        debug!(paths = request.paths.len(), "publish event recorded");
        self.read_project(request.publish_tag)
    }

    #[instrument(name = "history::read_project", level = "trace", skip(self))]
    pub fn read_project(&self, publish_tag: PublishTag) -> Result<PublishRecord, StoreError> {
        let mut record = query_opt(self.conn, Query::ReadProject, params![publish_tag], project_at)?
            .ok_or_else(|| StoreError::not_found("publish record", publish_tag))?;
        record.paths = self.read_project_resources(publish_tag)?;
        Ok(record)
    }

    /// Newest publish events first.
    #[instrument(name = "history::read_projects", level = "trace", skip(self))]
    pub fn read_projects(&self, limit: usize) -> Result<Vec<PublishRecord>, StoreError> {
        let limit =
            i64::try_from(limit).map_err(|_| StoreError::InvalidInput("limit is too large"))?;
        let mut records = query_rows(self.conn, Query::ReadProjects, params![limit], project_at)?;
        for record in &mut records {
            record.paths = self.read_project_resources(record.publish_tag)?;
        }
        Ok(records)
    }

    #[instrument(name = "history::read_project_resources", level = "trace", skip(self))]
    pub fn read_project_resources(&self, publish_tag: PublishTag) -> Result<Vec<String>, StoreError> {
        query_rows(
            self.conn,
            Query::ReadProjectResources,
            params![publish_tag],
            |row| row.get::<_, String>(0),
        )
    }
}

fn principal_at(row: &Row<'_>) -> rusqlite::Result<PrincipalSnapshot> {
    let kind = row.get::<_, String>(5)?;
    let kind = PrincipalKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, format!("unknown principal kind {kind}").into())
    })?;
    Ok(PrincipalSnapshot {
        principal_id: id_at(row, 0)?,
        name: row.get(1)?,
        ou: row.get(2)?,
        description: row.get(3)?,
        email: row.get(4)?,
        kind,
        deleted_by: id_at(row, 6)?,
        deleted_date: row.get(7)?,
    })
}

fn project_at(row: &Row<'_>) -> rusqlite::Result<PublishRecord> {
    Ok(PublishRecord {
        publish_tag: row.get(0)?,
        project_id: id_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        owner_id: id_at(row, 4)?,
        user_group_id: id_at(row, 5)?,
        manager_group_id: id_at(row, 6)?,
        date_created: row.get(7)?,
        published_by: id_at(row, 8)?,
        publish_date: row.get(9)?,
        paths: Vec::new(),
    })
}

impl SqliteHistoryStore {
    pub fn write_principal(&mut self, principal: &PrincipalSnapshot) -> Result<bool, StoreError> {
        self.in_transaction(|tx| tx.write_principal(principal))
    }

    pub fn read_principal(
        &mut self,
        principal_id: PrincipalId,
    ) -> Result<PrincipalSnapshot, StoreError> {
        self.in_transaction(|tx| tx.read_principal(principal_id))
    }

    pub fn write_project(
        &mut self,
        request: &WriteProjectRequest,
    ) -> Result<PublishRecord, StoreError> {
        self.in_transaction(|tx| tx.write_project(request))
    }

    pub fn read_project(&mut self, publish_tag: PublishTag) -> Result<PublishRecord, StoreError> {
        self.in_transaction(|tx| tx.read_project(publish_tag))
    }

    pub fn read_projects(&mut self, limit: usize) -> Result<Vec<PublishRecord>, StoreError> {
        self.in_transaction(|tx| tx.read_projects(limit))
    }

    pub fn read_project_resources(
        &mut self,
        publish_tag: PublishTag,
    ) -> Result<Vec<String>, StoreError> {
        self.in_transaction(|tx| tx.read_project_resources(publish_tag))
    }
}
