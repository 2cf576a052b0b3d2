#![forbid(unsafe_code)]

use super::support::{Query, execute, id_at, query_rows};
use super::{HistoryTx, SqliteHistoryStore, StoreError};
use hist_core::history::{Subscription, VisitEntry};
use hist_core::ids::{PrincipalId, StructureId};
use rusqlite::params;
use tracing::instrument;

impl HistoryTx<'_> {
    /// Replaces the visit marker of `user_id` for `structure_id`.
    #[instrument(name = "visits::mark", level = "trace", skip(self))]
    pub fn mark_resource_visited(
        &self,
        user_id: PrincipalId,
        structure_id: StructureId,
        date_visited: i64,
    ) -> Result<(), StoreError> {
        let user_id = user_id.to_string();
        let structure_id = structure_id.to_string();
        execute(self.conn, Query::DeleteVisit, params![user_id, structure_id])?;
        execute(
            self.conn,
            Query::InsertVisit,
            params![user_id, structure_id, date_visited],
        )?;
        Ok(())
    }

    /// Visits of `user_id`, newest first, optionally only those at or after `since`.
    #[instrument(name = "visits::read", level = "trace", skip(self))]
    pub fn read_visited(
        &self,
        user_id: PrincipalId,
        since: Option<i64>,
    ) -> Result<Vec<VisitEntry>, StoreError> {
        query_rows(
            self.conn,
            Query::ReadVisits,
            params![user_id.to_string(), since],
            |row| {
                Ok(VisitEntry {
                    user_id: id_at(row, 0)?,
                    structure_id: id_at(row, 1)?,
                    date_visited: row.get(2)?,
                })
            },
        )
    }

    #[instrument(name = "visits::delete_older_than", level = "debug", skip(self))]
    pub fn delete_visits_older_than(&self, date: i64) -> Result<usize, StoreError> {
        execute(self.conn, Query::DeleteVisitsBefore, params![date])
    }

    /// Subscribes, reviving a soft-deleted subscription.
    #[instrument(name = "subscriptions::subscribe", level = "trace", skip(self))]
    pub fn subscribe(
        &self,
        principal_id: PrincipalId,
        structure_id: StructureId,
    ) -> Result<(), StoreError> {
        execute(
            self.conn,
            Query::Subscribe,
            params![principal_id.to_string(), structure_id.to_string()],
        )?;
        Ok(())
    }

    /// Hard delete; returns whether a subscription existed.
    #[instrument(name = "subscriptions::unsubscribe", level = "trace", skip(self))]
    pub fn unsubscribe(
        &self,
        principal_id: PrincipalId,
        structure_id: StructureId,
    ) -> Result<bool, StoreError> {
        let removed = execute(
            self.conn,
            Query::Unsubscribe,
            params![principal_id.to_string(), structure_id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// Soft-deletes every active subscription of `structure_id`.
    #[instrument(name = "subscriptions::mark_deleted", level = "debug", skip(self))]
    pub fn mark_subscriptions_deleted(
        &self,
        structure_id: StructureId,
        date_deleted: i64,
    ) -> Result<usize, StoreError> {
        if date_deleted <= 0 {
            return Err(StoreError::InvalidInput("deletion date must be positive"));
        }
        execute(
            self.conn,
            Query::MarkSubscriptionsDeleted,
            params![structure_id.to_string(), date_deleted],
        )
    }

    #[instrument(name = "subscriptions::read", level = "trace", skip(self))]
    pub fn read_subscribed(
        &self,
        principal_id: PrincipalId,
        include_deleted: bool,
    ) -> Result<Vec<Subscription>, StoreError> {
        query_rows(
            self.conn,
            Query::ReadSubscribed,
            params![principal_id.to_string(), include_deleted],
            |row| {
                Ok(Subscription {
                    principal_id: id_at(row, 0)?,
                    structure_id: id_at(row, 1)?,
                    date_deleted: row.get(2)?,
                })
            },
        )
    }

    #[instrument(name = "subscriptions::delete_deleted_before", level = "debug", skip(self))]
    pub fn delete_subscriptions_deleted_before(&self, date: i64) -> Result<usize, StoreError> {
        execute(
            self.conn,
            Query::DeleteSubscriptionsDeletedBefore,
            params![date],
        )
    }
}

impl SqliteHistoryStore {
    pub fn mark_resource_visited(
        &mut self,
        user_id: PrincipalId,
        structure_id: StructureId,
        date_visited: i64,
    ) -> Result<(), StoreError> {
        self.in_transaction(|tx| tx.mark_resource_visited(user_id, structure_id, date_visited))
    }

    pub fn read_visited(
        &mut self,
        user_id: PrincipalId,
        since: Option<i64>,
    ) -> Result<Vec<VisitEntry>, StoreError> {
        self.in_transaction(|tx| tx.read_visited(user_id, since))
    }

    pub fn delete_visits_older_than(&mut self, date: i64) -> Result<usize, StoreError> {
        self.in_transaction(|tx| tx.delete_visits_older_than(date))
    }

    pub fn subscribe(
        &mut self,
        principal_id: PrincipalId,
        structure_id: StructureId,
    ) -> Result<(), StoreError> {
        self.in_transaction(|tx| tx.subscribe(principal_id, structure_id))
    }

    pub fn unsubscribe(
        &mut self,
        principal_id: PrincipalId,
        structure_id: StructureId,
    ) -> Result<bool, StoreError> {
        self.in_transaction(|tx| tx.unsubscribe(principal_id, structure_id))
    }

    pub fn mark_subscriptions_deleted(
        &mut self,
        structure_id: StructureId,
        date_deleted: i64,
    ) -> Result<usize, StoreError> {
        self.in_transaction(|tx| tx.mark_subscriptions_deleted(structure_id, date_deleted))
    }

    pub fn read_subscribed(
        &mut self,
        principal_id: PrincipalId,
        include_deleted: bool,
    ) -> Result<Vec<Subscription>, StoreError> {
        self.in_transaction(|tx| tx.read_subscribed(principal_id, include_deleted))
    }

    pub fn delete_subscriptions_deleted_before(&mut self, date: i64) -> Result<usize, StoreError> {
        self.in_transaction(|tx| tx.delete_subscriptions_deleted_before(date))
    }
}
