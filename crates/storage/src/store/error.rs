#![forbid(unsafe_code)]

use super::support::Query;
use hist_core::history::HistoryError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("query {query} failed: {source}")]
    Storage {
        query: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },
    #[error("data consistency violation: {0}")]
    DataConsistency(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl StoreError {
    pub(in crate::store) fn storage(query: Query, source: rusqlite::Error) -> Self {
        Self::Storage {
            query: query.name(),
            source,
        }
    }

    pub(in crate::store) fn not_found(what: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<HistoryError> for StoreError {
    fn from(value: HistoryError) -> Self {
        match value {
            HistoryError::DataConsistency(message) => Self::DataConsistency(message),
        }
    }
}
