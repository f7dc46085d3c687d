//! Store error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store already closed")]
    AlreadyClosed,

    #[error("corrupt record for job '{0}': {1}")]
    Corrupt(String, String),
}
