//! SQLite pool construction and schema management.
//!
//! The store runs in WAL mode with relaxed fsync so the single writer
//! never blocks the API's readers. Writers size their pool at 1 to keep
//! one transaction in flight; the API uses a small read pool.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::IndexError;

const SCHEMA: &str = "
    CREATE TABLE metadata (
        bucket          TEXT NOT NULL,
        name            TEXT NOT NULL,
        size            INTEGER NOT NULL,
        updated         TIMESTAMP NOT NULL,
        created         TIMESTAMP NOT NULL,
        parent          TEXT,
        storage_class   TEXT NOT NULL CHECK (storage_class IN ('STANDARD', 'NEARLINE', 'COLDLINE', 'ARCHIVE')),
        FOREIGN KEY (parent) REFERENCES directory(name),
        PRIMARY KEY (bucket, name)
    );

    CREATE TABLE directory (
        bucket          TEXT NOT NULL,
        name            TEXT NOT NULL,
        count           INTEGER DEFAULT 0,
        size_standard   INTEGER DEFAULT 0,
        size_nearline   INTEGER DEFAULT 0,
        size_coldline   INTEGER DEFAULT 0,
        size_archive    INTEGER DEFAULT 0,
        parent          TEXT,
        FOREIGN KEY (parent) REFERENCES directory(name),
        PRIMARY KEY (bucket, name)
    );
";

// Built only after the seeder finishes so bulk inserts stay linear.
const INDEXES: &str = "
    CREATE INDEX idx_metadata_parent    ON metadata(parent);
    CREATE INDEX idx_directory_parent   ON directory(parent);
    CREATE INDEX idx_directory_name     ON directory(name);
    VACUUM;
";

/// Shared handle to the index store.
#[derive(Clone)]
pub struct Database {
    pub pool: Arc<SqlitePool>,
}

impl Database {
    /// Open (or create) the database at `url` with the index pragmas
    /// applied to every connection.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Database, IndexError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-62500"); // 64 MiB page cache

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Ok(Database {
            pool: Arc::new(pool),
        })
    }

    /// Create the two index tables. Errors if they already exist.
    pub async fn create_tables(&self) -> Result<(), IndexError> {
        self.execute_batch(SCHEMA).await
    }

    /// Returns whether the schema has been created, by probing for the
    /// metadata table.
    pub async fn ping_table(&self) -> Result<bool, IndexError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'metadata')",
        )
        .fetch_one(&*self.pool)
        .await?;
        Ok(exists)
    }

    /// Create the query indexes and repackage the database file.
    pub async fn create_indexes(&self) -> Result<(), IndexError> {
        self.execute_batch(INDEXES).await
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), IndexError> {
        let statements = sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        for stmt in statements {
            sqlx::query(stmt).execute(&*self.pool).await?;
        }
        Ok(())
    }
}
