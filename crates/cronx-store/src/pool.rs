//! SQLite connection pool management.

use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::{info, warn};

use crate::error::StoreError;

/// Wraps a [`SqlitePool`] with idempotent migration, health-check, and
/// close operations. Closing twice is a no-op from the pool's point of
/// view but the owning [`crate::CronxStore`] guards repeat calls with
/// an [`AlreadyClosed`](StoreError::AlreadyClosed) error instead.
pub struct StorePool {
    pool: SqlitePool,
    closed: AtomicBool,
}

impl StorePool {
    /// Opens (creating if absent) the SQLite file at `path`.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        info!(path, "opening CRONX store");

        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to open store");
                e
            })?;

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    /// Opens an in-memory store, useful for tests.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        Self::connect(":memory:").await
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs pending migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("running store migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Checks the connection is alive.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::AlreadyClosed);
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Idempotent teardown. A repeat call is a logged no-op rather than
    /// an error — callers that need "fail loudly on reuse" semantics
    /// get that from [`crate::CronxStore::close`], which tracks its own
    /// closed flag before delegating here.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("closing store");
        self.pool.close().await;
    }
}
