//! Durable key/value + append-log persistence for job state and run
//! history.

use std::sync::atomic::{AtomicBool, Ordering};

use cronx_core::{JobState, RunRecord, RunStatus};
use sqlx::Row;
use tracing::warn;

use crate::error::StoreError;
use crate::pool::StorePool;

/// Accessed only from the scheduler's control path — serialized access
/// by a single caller, not a concurrent mutator.
pub struct CronxStore {
    pool: StorePool,
    closed: AtomicBool,
}

impl CronxStore {
    /// Opens the store at `path` and runs migrations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let pool = StorePool::connect(path).await?;
        pool.run_migrations().await?;
        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::AlreadyClosed);
        }
        Ok(())
    }

    /// Upserts a job's state by name, overwriting the mutable columns.
    pub async fn save_job_state(&self, name: &str, state: &JobState) -> Result<(), StoreError> {
        self.check_open()?;
        let now = now_ms();

        sqlx::query(
            "INSERT INTO jobs (name, next_run, last_run, enabled, fail_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(name) DO UPDATE SET
                next_run = excluded.next_run,
                last_run = excluded.last_run,
                enabled = excluded.enabled,
                fail_count = excluded.fail_count,
                updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(state.next_run)
        .bind(state.last_run)
        .bind(i64::from(state.enabled))
        .bind(i64::from(state.fail_count))
        .bind(now)
        .execute(self.pool.inner())
        .await?;

        Ok(())
    }

    /// Fetches a job's persisted state, if any. A row that exists but
    /// cannot be decoded surfaces as [`StoreError::Corrupt`] rather than
    /// a generic `sqlx::Error`, so callers can distinguish "no state yet"
    /// from "state present but unreadable" and re-initialize the job
    /// instead of propagating a database-shaped error.
    pub async fn get_job_state(&self, name: &str) -> Result<Option<JobState>, StoreError> {
        self.check_open()?;
        let row = sqlx::query("SELECT next_run, last_run, enabled, fail_count FROM jobs WHERE name = ?1")
            .bind(name)
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(|r| row_to_job_state(r).map_err(|e| StoreError::Corrupt(name.to_string(), e.to_string())))
            .transpose()
    }

    /// Returns every persisted job state, sorted by name.
    pub async fn get_all_job_states(&self) -> Result<Vec<(String, JobState)>, StoreError> {
        self.check_open()?;
        let rows = sqlx::query(
            "SELECT name, next_run, last_run, enabled, fail_count FROM jobs ORDER BY name ASC",
        )
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter()
            .map(|row| {
                let name: String = row.try_get("name")?;
                let state = row_to_job_state(row).map_err(|e| StoreError::Corrupt(name.clone(), e.to_string()))?;
                Ok((name, state))
            })
            .collect()
    }

    /// Appends a run record, returning its assigned id.
    pub async fn record_run(&self, record: &RunRecord) -> Result<i64, StoreError> {
        self.check_open()?;
        let result = sqlx::query(
            "INSERT INTO runs (job_name, scheduled_at, triggered_at, completed_at, duration_ms, status, response, error, attempts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&record.job_name)
        .bind(record.scheduled_at)
        .bind(record.triggered_at)
        .bind(record.completed_at)
        .bind(record.duration_ms)
        .bind(record.status.as_str())
        .bind(&record.response)
        .bind(&record.error)
        .bind(i64::from(record.attempts))
        .execute(self.pool.inner())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns up to `limit` most recent runs for `name`, newest first.
    pub async fn get_recent_runs(&self, name: &str, limit: i64) -> Result<Vec<RunRecord>, StoreError> {
        self.check_open()?;
        let rows = sqlx::query(
            "SELECT id, job_name, scheduled_at, triggered_at, completed_at, duration_ms, status, response, error, attempts
             FROM runs WHERE job_name = ?1 ORDER BY triggered_at DESC LIMIT ?2",
        )
        .bind(name)
        .bind(limit)
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(row_to_run_record).collect()
    }

    /// Idempotent-but-loud teardown: a second call returns
    /// [`StoreError::AlreadyClosed`] instead of silently no-opping, unlike
    /// the pool's own close (which stays a no-op so drop order never
    /// panics).
    pub async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::AlreadyClosed);
        }
        self.pool.close().await;
        Ok(())
    }
}

fn now_ms() -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    ms
}

fn row_to_job_state(row: sqlx::sqlite::SqliteRow) -> Result<JobState, StoreError> {
    let enabled: i64 = row.try_get("enabled")?;
    let fail_count: i64 = row.try_get("fail_count")?;
    Ok(JobState {
        next_run: row.try_get("next_run")?,
        last_run: row.try_get("last_run")?,
        enabled: enabled != 0,
        fail_count: u32::try_from(fail_count).unwrap_or(0),
    })
}

fn row_to_run_record(row: sqlx::sqlite::SqliteRow) -> Result<RunRecord, StoreError> {
    let job_name: String = row.try_get("job_name")?;
    let status_str: String = row.try_get("status")?;
    let attempts: i64 = row.try_get("attempts")?;
    let status = match status_str.as_str() {
        "success" => RunStatus::Success,
        "failed" => RunStatus::Failed,
        "timeout" => RunStatus::Timeout,
        other => {
            warn!(job = %job_name, status = other, "unrecognized run status, treating as failed");
            RunStatus::Failed
        }
    };

    Ok(RunRecord {
        id: row.try_get("id")?,
        job_name,
        scheduled_at: row.try_get("scheduled_at")?,
        triggered_at: row.try_get("triggered_at")?,
        completed_at: row.try_get("completed_at")?,
        duration_ms: row.try_get("duration_ms")?,
        status,
        response: row.try_get("response")?,
        error: row.try_get("error")?,
        attempts: u32::try_from(attempts).unwrap_or(0),
    })
}
