//! The conductor: owns one timer per job, fires each via the [`Runner`]
//! at the time its strategy returned, updates state, re-arms.
//!
//! Per-job timers rather than a single shared "next job" timer: each
//! enabled job gets its own `tokio::spawn`ed task looping
//! sleep-then-fire, so jobs never block each other and `stop()` can
//! cancel every pending sleep at once via a broadcast signal without
//! touching a fire already in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cronx_core::{Job, JobState, Rng, RunRecord, RunStatus, Strategy};
use cronx_store::{CronxStore, StoreError};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::RunnerError;
use crate::runner::Runner;

/// A read-only snapshot of a job's scheduling state, exposed as absolute
/// timestamps rather than deltas, in the order jobs were registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub name: String,
    pub next_run: Option<i64>,
    pub last_run: Option<i64>,
    pub enabled: bool,
}

/// Owns the in-memory `JobState` map and the per-job timers. The `Store`
/// is the single writer of persisted state and the scheduler holds the
/// only reference to it.
pub struct Scheduler {
    jobs: Vec<Job>,
    store: Arc<CronxStore>,
    runner: Arc<Runner>,
    seed: Option<String>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    states: Arc<RwLock<HashMap<String, JobState>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Builds a scheduler over `jobs`, not yet started. `seed`, if given,
    /// deterministically drives every job's strategy by deriving one RNG
    /// per job from it (so a single master seed still diversifies draws
    /// across jobs rather than lock-stepping them).
    #[must_use]
    pub fn new(jobs: Vec<Job>, store: Arc<CronxStore>, runner: Arc<Runner>, seed: Option<String>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            jobs,
            store,
            runner,
            seed,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            states: Arc::new(RwLock::new(HashMap::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Idempotent when already running. On first start, loads each job's
    /// persisted state (or constructs an initial one), then arms a timer
    /// task for every enabled job.
    pub async fn start(&self) -> Result<(), RunnerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!(jobs = self.jobs.len(), "starting scheduler");
        let now = now_ms();

        for job in &self.jobs {
            job.validate()?;

            // One strategy instance (and so one RNG) per job for its
            // entire lifetime — used here for the initial-state draw
            // when no persisted state exists, then moved into the
            // job's own task so its sequence is never restarted.
            let strategy = Strategy::new(job.strategy.clone(), self.rng_for(&job.name));

            // A corrupt row is logged and the job is skipped forward to a
            // fresh initial state rather than failing the whole scheduler
            // start — spec's StateCorruption policy.
            let persisted = match self.store.get_job_state(&job.name).await {
                Ok(s) => s,
                Err(StoreError::Corrupt(name, reason)) => {
                    warn!(job = %name, reason = %reason, "unreadable job state, re-initializing from job definition");
                    None
                }
                Err(e) => return Err(e.into()),
            };

            let state = match persisted {
                Some(s) => s,
                None => {
                    let next_run = if job.enabled {
                        Some(strategy.calculate_next_run(None, now)?)
                    } else {
                        None
                    };
                    let initial = JobState {
                        next_run,
                        last_run: None,
                        enabled: job.enabled,
                        fail_count: 0,
                    };
                    self.store.save_job_state(&job.name, &initial).await?;
                    initial
                }
            };

            self.states.write().insert(job.name.clone(), state);

            if state.enabled {
                self.arm(job.clone(), strategy);
            }
        }

        Ok(())
    }

    /// Spawns the per-job loop: sleep until `next_run`, fire, update
    /// state, re-arm — until disabled or the scheduler stops.
    fn arm(&self, job: Job, strategy: Strategy) {
        let runner = Arc::clone(&self.runner);
        let store = Arc::clone(&self.store);
        let running = Arc::clone(&self.running);
        let states = Arc::clone(&self.states);
        let shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(run_job_loop(job, strategy, runner, store, running, shutdown_rx, states));
        self.handles.lock().push(handle);
    }

    fn rng_for(&self, job_name: &str) -> Rng {
        match &self.seed {
            Some(seed) => Rng::from_seed(&format!("{seed}:{job_name}")),
            None => Rng::unseeded(),
        }
    }

    /// Idempotent. Cancels all pending timers immediately (an in-flight
    /// fire is left to complete; its own re-arm will no-op once it
    /// observes the scheduler stopped) and flushes the current state map.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let snapshot: Vec<(String, JobState)> = self
            .states
            .read()
            .iter()
            .map(|(name, state)| (name.clone(), *state))
            .collect();
        for (name, state) in snapshot {
            if let Err(e) = self.store.save_job_state(&name, &state).await {
                warn!(job = %name, error = %e, "failed to flush state on stop");
            }
        }

        Ok(())
    }

    /// Returns `true` while the scheduler is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of every job's status, in registration order.
    #[must_use]
    pub fn status(&self) -> Vec<JobStatus> {
        let states = self.states.read();
        self.jobs
            .iter()
            .map(|job| {
                let state = states.get(&job.name).copied().unwrap_or_else(|| JobState::initial(job.enabled));
                JobStatus {
                    name: job.name.clone(),
                    next_run: state.next_run,
                    last_run: state.last_run,
                    enabled: state.enabled,
                }
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_job_loop(
    job: Job,
    strategy: Strategy,
    runner: Arc<Runner>,
    store: Arc<CronxStore>,
    running: Arc<AtomicBool>,
    mut shutdown_rx: broadcast::Receiver<()>,
    states: Arc<RwLock<HashMap<String, JobState>>>,
) {
    loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }

        let Some(next_run) = states.read().get(&job.name).and_then(|s| s.next_run) else {
            return;
        };
        let delay_ms = (next_run - now_ms()).max(0);

        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!(job = %job.name, "shutdown received, dropping pending timer");
                return;
            }
            () = tokio::time::sleep(Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0))) => {}
        }

        if !running.load(Ordering::SeqCst) {
            return;
        }

        let mut state = states
            .read()
            .get(&job.name)
            .copied()
            .unwrap_or_else(|| JobState::initial(job.enabled));
        if !state.enabled {
            return;
        }

        if matches!(strategy.should_run(), Some(false)) {
            let now = now_ms();
            match strategy.calculate_next_run(state.last_run, now) {
                Ok(next) => state.next_run = Some(next),
                Err(e) => {
                    error!(job = %job.name, error = %e, "strategy failed computing next check, halting job");
                    return;
                }
            }
            states.write().insert(job.name.clone(), state);
            if let Err(e) = store.save_job_state(&job.name, &state).await {
                warn!(job = %job.name, error = %e, "failed to persist state after skipped check");
            }
            continue;
        }

        let scheduled_at = next_run;
        let result = runner.run(&job).await;
        let now = now_ms();

        state.last_run = Some(now);
        if result.status == RunStatus::Success {
            state.fail_count = 0;
        } else {
            state.fail_count += 1;
        }

        // `scheduledAt` and `triggeredAt` are both `next_run`, the
        // timer's pre-fire intended time: `RunResult` exposes no
        // separately-measured runner start time, so there is nothing
        // else to put in `triggeredAt` here.
        let record = RunRecord {
            id: None,
            job_name: job.name.clone(),
            scheduled_at,
            triggered_at: scheduled_at,
            completed_at: now,
            duration_ms: result.duration_ms,
            status: result.status,
            response: result.response,
            error: result.error,
            attempts: result.attempts,
        };
        if let Err(e) = store.record_run(&record).await {
            warn!(job = %job.name, error = %e, "failed to record run");
        }

        match strategy.calculate_next_run(state.last_run, now) {
            Ok(next) => state.next_run = Some(next),
            Err(e) => {
                error!(job = %job.name, error = %e, "strategy failed computing next run, halting job");
                states.write().insert(job.name.clone(), state);
                return;
            }
        }

        states.write().insert(job.name.clone(), state);
        if let Err(e) = store.save_job_state(&job.name, &state).await {
            warn!(job = %job.name, error = %e, "failed to persist state after fire");
        }

        if !running.load(Ordering::SeqCst) || !state.enabled {
            return;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cronx_core::{Action, Priority, ProbabilisticConfig, StrategyConfig};
    use std::sync::atomic::AtomicUsize;

    use crate::executor::{Executor, TriggerOutcome};

    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
        succeed: bool,
    }

    #[async_trait]
    impl Executor for CountingExecutor {
        async fn trigger(
            &self,
            _message: &str,
            _priority: Priority,
            _context: Option<&cronx_core::DeliveryHints>,
            _timeout: Duration,
        ) -> TriggerOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TriggerOutcome {
                success: self.succeed,
                message: Some("ok".to_string()),
                error: if self.succeed { None } else { Some("boom".to_string()) },
            }
        }

        async fn notify(&self, _message: &str, _priority: Priority) -> Result<(), String> {
            Ok(())
        }
    }

    fn probabilistic_job(name: &str, probability: f64) -> Job {
        Job {
            name: name.to_string(),
            strategy: StrategyConfig::Probabilistic(ProbabilisticConfig {
                check_interval_secs: 1,
                probability,
            }),
            action: Action {
                message: "nudge".to_string(),
                priority: Priority::Normal,
            },
            enabled: true,
            retry: None,
            on_failure: None,
            delivery_hints: None,
            session_url: None,
            session_key: None,
        }
    }

    async fn open_store() -> Arc<CronxStore> {
        Arc::new(CronxStore::open(":memory:").await.unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_probability_zero_never_fires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Box::new(CountingExecutor {
            calls: Arc::clone(&calls),
            succeed: true,
        });
        let runner = Arc::new(Runner::new(executor));
        let store = open_store().await;
        let job = probabilistic_job("never", 0.0);

        let scheduler = Scheduler::new(vec![job], store, runner, Some("seed-zero".to_string()));
        scheduler.start().await.unwrap();

        for _ in 0..10 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let status = scheduler.status();
        assert_eq!(status.len(), 1);
        assert!(status[0].last_run.is_none());
        assert_eq!(status[0].next_run.is_some(), true);
        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_probability_one_fires_every_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Box::new(CountingExecutor {
            calls: Arc::clone(&calls),
            succeed: true,
        });
        let runner = Arc::new(Runner::new(executor));
        let store = open_store().await;
        let job = probabilistic_job("always", 1.0);

        let scheduler = Scheduler::new(vec![job], store, runner, Some("seed-one".to_string()));
        scheduler.start().await.unwrap();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        assert!(calls.load(Ordering::SeqCst) >= 4);
        let status = scheduler.status();
        assert!(status[0].last_run.is_some());
        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_further_executor_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Box::new(CountingExecutor {
            calls: Arc::clone(&calls),
            succeed: true,
        });
        let runner = Arc::new(Runner::new(executor));
        let store = open_store().await;
        let job = probabilistic_job("quiesce", 1.0);

        let scheduler = Scheduler::new(vec![job], store, runner, Some("seed-quiesce".to_string()));
        scheduler.start().await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        scheduler.stop().await.unwrap();
        let observed = calls.load(Ordering::SeqCst);

        for _ in 0..20 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), observed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_count_increments_on_failure() {
        let executor = Box::new(CountingExecutor {
            calls: Arc::new(AtomicUsize::new(0)),
            succeed: false,
        });
        let runner = Arc::new(Runner::new(executor));
        let store = open_store().await;
        let mut job = probabilistic_job("failing", 1.0);
        job.retry = Some(cronx_core::RetryConfig {
            attempts: 1,
            backoff: cronx_core::BackoffKind::Fixed,
            timeout_secs: 5,
        });
        job.on_failure = Some(cronx_core::OnFailure::Silent);

        let scheduler = Scheduler::new(vec![job], Arc::clone(&store), runner, Some("seed-fail".to_string()));
        scheduler.start().await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        let state = store.get_job_state("failing").await.unwrap().unwrap();
        assert_eq!(state.fail_count, 1);
        assert!(state.last_run.is_some());
        scheduler.stop().await.unwrap();
    }

    struct ToggleExecutor {
        calls: Arc<AtomicUsize>,
        fail_first_n: usize,
    }

    #[async_trait]
    impl Executor for ToggleExecutor {
        async fn trigger(
            &self,
            _message: &str,
            _priority: Priority,
            _context: Option<&cronx_core::DeliveryHints>,
            _timeout: Duration,
        ) -> TriggerOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first_n {
                TriggerOutcome {
                    success: false,
                    message: None,
                    error: Some("not yet".to_string()),
                }
            } else {
                TriggerOutcome {
                    success: true,
                    message: Some("ok".to_string()),
                    error: None,
                }
            }
        }

        async fn notify(&self, _message: &str, _priority: Priority) -> Result<(), String> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_count_resets_after_eventual_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Box::new(ToggleExecutor {
            calls: Arc::clone(&calls),
            fail_first_n: 2,
        });
        let runner = Arc::new(Runner::new(executor));
        let store = open_store().await;
        let mut job = probabilistic_job("recovers", 1.0);
        job.retry = Some(cronx_core::RetryConfig {
            attempts: 3,
            backoff: cronx_core::BackoffKind::Fixed,
            timeout_secs: 5,
        });

        let scheduler = Scheduler::new(vec![job], Arc::clone(&store), runner, Some("seed-recover".to_string()));
        scheduler.start().await.unwrap();

        // One fire: the runner itself retries internally (2 failures then
        // a success), so a single tick already lands on fail_count = 0.
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        let state = store.get_job_state("recovers").await.unwrap().unwrap();
        assert_eq!(state.fail_count, 0);
        scheduler.stop().await.unwrap();
    }
}
