//! SQLite connection pool wrapper for the storage crate.

use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use tracing::info;

/// Manages a single SQLite pool; creates the DB file if missing.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Creates a pool for the given database path (file or in-memory).
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(database_url = %database_url, "Initializing SQLite pool");

        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_url);

        let pool = SqlitePool::connect_with(options).await?;

        Ok(Self { pool })
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
