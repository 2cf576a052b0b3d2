#![forbid(unsafe_code)]

mod audit;
mod error;
mod live;
mod properties;
mod prune;
mod reconstruct;
mod requests;
mod subscriptions;
mod support;
mod write;

pub use error::StoreError;
pub use live::*;
pub use requests::*;

use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use support::{install_schema, preflight_gate};
use tracing::debug;

const DEFAULT_DB_FILE_NAME: &str = "history.db";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryConfig {
    pub storage_dir: PathBuf,
    pub db_file_name: String,
    pub busy_timeout: Duration,
}

impl HistoryConfig {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file_name)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("."),
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// History and subscription driver over one SQLite database.
///
/// Every convenience method is one unit of work; use [`SqliteHistoryStore::in_transaction`]
/// to group several writes of one publish event.
pub struct SqliteHistoryStore {
    conn: Connection,
    config: HistoryConfig,
    live: Box<dyn LiveTree>,
}

impl fmt::Debug for SqliteHistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteHistoryStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteHistoryStore {
    pub fn open(
        storage_dir: impl AsRef<Path>,
        live: impl LiveTree + 'static,
    ) -> Result<Self, StoreError> {
        Self::open_with(HistoryConfig::new(storage_dir), live)
    }

    pub fn open_with(
        config: HistoryConfig,
        live: impl LiveTree + 'static,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.storage_dir)?;

        let db_path = config.db_path();
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;
        debug!(path = %db_path.display(), "history store opened");

        Ok(Self {
            conn,
            config,
            live: Box::new(live),
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Runs `f` in one transaction: committed on `Ok`, rolled back on `Err`.
    pub fn in_transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&HistoryTx<'_>) -> Result<T, StoreError>,
    {
        let tx = self.conn.transaction()?;
        let out = f(&HistoryTx {
            conn: &tx,
            live: self.live.as_ref(),
        })?;
        tx.commit()?;
        Ok(out)
    }
}

/// Operations bound to one open transaction.
pub struct HistoryTx<'a> {
    conn: &'a Connection,
    live: &'a dyn LiveTree,
}
