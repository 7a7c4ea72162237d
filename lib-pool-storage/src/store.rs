//! SQLite store and transaction handle

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::errors::{StorageError, StorageResult};
use crate::schema::MIGRATION_V1;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed repository for every pool entity
///
/// Cheap to clone; clones share the connection pool and the writer lock.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    ///
    /// Enables WAL mode and foreign keys and runs the embedded migration.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let url = format!("sqlite:{}?mode=rwc", path.display());

        info!("Opening pool store at: {}", path.display());

        let options = SqliteConnectOptions::from_str(&url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        info!("Pool store initialized");

        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Open an in-memory database (for testing and demo mode)
    ///
    /// Each SQLite in-memory connection is its own database, so the pool holds
    /// exactly one connection and never recycles it.
    pub async fn open_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
        debug!("Running pool store migrations...");

        sqlx::raw_sql(MIGRATION_V1)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        debug!("Migrations completed successfully");
        Ok(())
    }

    /// Start a write unit
    ///
    /// Holds the store's writer lock until the returned handle is committed or
    /// dropped, so check-then-write sequences inside it are serialized against
    /// every other write unit.
    pub async fn begin(&self) -> StorageResult<StoreTx> {
        // Lock before acquiring a connection; the reverse order can deadlock
        // against readers when the pool has a single connection.
        let guard = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(StoreTx {
            tx,
            _writer: Some(guard),
        })
    }

    /// Start a read-only unit
    pub async fn read(&self) -> StorageResult<StoreTx> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx { tx, _writer: None })
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// One atomic unit of work against the store
///
/// Query methods live in `pool_queries` and `proposal_queries`.
pub struct StoreTx {
    pub(crate) tx: sqlx::Transaction<'static, Sqlite>,
    _writer: Option<OwnedMutexGuard<()>>,
}

impl StoreTx {
    /// Make every write in this unit durable
    pub async fn commit(self) -> StorageResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl std::fmt::Debug for StoreTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTx")
            .field("writer", &self._writer.is_some())
            .finish()
    }
}
