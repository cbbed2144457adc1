//! Background rebuild scheduler for logically expired entries.
//!
//! A bounded queue feeds a fixed number of workers. Each task may carry the
//! lock key its submitter acquired; the worker releases it once the task has
//! finished, failed or timed out. Every outcome is logged, counted and
//! published as a [`RebuildEvent`].

use crate::lock::DistributedLock;
use crate::metrics::RebuildMetrics;
use dianping_config::RebuildConfig;
use dianping_core::{DianpingError, DianpingResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct RebuildSchedulerConfig {
    /// Number of tasks running at once.
    pub concurrency: usize,

    /// Tasks that may wait for a worker before submissions are rejected.
    pub queue_capacity: usize,

    /// Upper bound on a single task.
    pub task_timeout: Duration,
}

impl Default for RebuildSchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            queue_capacity: 1024,
            task_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&RebuildConfig> for RebuildSchedulerConfig {
    fn from(config: &RebuildConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            queue_capacity: config.queue_capacity,
            task_timeout: config.task_timeout(),
        }
    }
}

/// Scheduler rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RebuildError {
    /// The queue is at capacity.
    #[error("Rebuild queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The scheduler no longer accepts work.
    #[error("Rebuild scheduler is shut down")]
    ShutDown,
}

impl From<RebuildError> for DianpingError {
    fn from(err: RebuildError) -> Self {
        DianpingError::Cache(err.to_string())
    }
}

/// A unit of rebuild work.
pub struct RebuildTask {
    key: String,
    lock_key: Option<String>,
    job: BoxFuture<'static, DianpingResult<()>>,
}

impl RebuildTask {
    /// Creates a task rebuilding `key`.
    pub fn new<F>(key: impl Into<String>, job: F) -> Self
    where
        F: Future<Output = DianpingResult<()>> + Send + 'static,
    {
        Self {
            key: key.into(),
            lock_key: None,
            job: Box::pin(job),
        }
    }

    /// Hands `lock_key` to the worker, which releases it after the task.
    #[must_use]
    pub fn with_lock(mut self, lock_key: impl Into<String>) -> Self {
        self.lock_key = Some(lock_key.into());
        self
    }

    /// The entity key being rebuilt.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The lock key released after the task, if any.
    #[must_use]
    pub fn lock_key(&self) -> Option<&str> {
        self.lock_key.as_deref()
    }
}

impl std::fmt::Debug for RebuildTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildTask")
            .field("key", &self.key)
            .field("lock_key", &self.lock_key)
            .finish_non_exhaustive()
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

impl RebuildOutcome {
    /// Metric label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    /// Returns true for `Completed`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Published once per finished task.
#[derive(Debug, Clone)]
pub struct RebuildEvent {
    pub key: String,
    pub outcome: RebuildOutcome,
    pub elapsed: Duration,
}

/// Scheduler statistics.
#[derive(Debug, Clone)]
pub struct RebuildStats {
    pub id: String,
    pub running: bool,
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
}

/// State shared between the scheduler handle and its workers.
struct Shared {
    lock: DistributedLock,
    task_timeout: Duration,
    events: broadcast::Sender<RebuildEvent>,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
}

/// Bounded worker pool for cache rebuilds.
pub struct RebuildScheduler {
    id: String,
    config: RebuildSchedulerConfig,
    queue: mpsc::Sender<RebuildTask>,
    shutdown_tx: broadcast::Sender<()>,
    running: AtomicBool,
    shared: Arc<Shared>,
}

impl RebuildScheduler {
    /// Creates the scheduler and spawns its dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: RebuildSchedulerConfig, lock: DistributedLock) -> Self {
        let concurrency = config.concurrency.max(1);
        let (queue, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let id = format!("rebuild-{}", Uuid::new_v4());
        let shared = Arc::new(Shared {
            lock,
            task_timeout: config.task_timeout,
            events,
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
        });

        info!(
            scheduler_id = %id,
            concurrency,
            queue_capacity = config.queue_capacity,
            task_timeout_ms = config.task_timeout.as_millis() as u64,
            "Starting rebuild scheduler"
        );
        RebuildMetrics::concurrency(concurrency);

        tokio::spawn(
            dispatch(
                rx,
                Arc::new(Semaphore::new(concurrency)),
                shutdown_rx,
                shared.clone(),
            )
            .instrument(tracing::info_span!("rebuild_dispatcher", scheduler_id = %id)),
        );

        Self {
            id,
            config,
            queue,
            shutdown_tx,
            running: AtomicBool::new(true),
            shared,
        }
    }

    /// Queues a task without waiting.
    pub fn submit(&self, task: RebuildTask) -> Result<(), RebuildError> {
        if !self.is_running() {
            RebuildMetrics::rejected("shut_down");
            return Err(RebuildError::ShutDown);
        }

        match self.queue.try_send(task) {
            Ok(()) => {
                RebuildMetrics::submitted();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(task)) => {
                warn!(key = %task.key, capacity = self.config.queue_capacity, "Rebuild queue full");
                RebuildMetrics::rejected("queue_full");
                Err(RebuildError::QueueFull {
                    capacity: self.config.queue_capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                RebuildMetrics::rejected("shut_down");
                Err(RebuildError::ShutDown)
            }
        }
    }

    /// Subscribes to task outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<RebuildEvent> {
        self.shared.events.subscribe()
    }

    /// Stops accepting and dispatching tasks.
    ///
    /// Running tasks are left to finish; queued ones are dropped and their
    /// locks lapse with their lease.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(scheduler_id = %self.id, "Stopping rebuild scheduler...");
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Check if the scheduler accepts tasks.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Tasks that completed.
    pub fn tasks_completed(&self) -> u64 {
        self.shared.tasks_completed.load(Ordering::Relaxed)
    }

    /// Tasks that failed or timed out.
    pub fn tasks_failed(&self) -> u64 {
        self.shared.tasks_failed.load(Ordering::Relaxed)
    }

    /// Get scheduler statistics.
    pub fn stats(&self) -> RebuildStats {
        RebuildStats {
            id: self.id.clone(),
            running: self.is_running(),
            concurrency: self.config.concurrency,
            queue_capacity: self.config.queue_capacity,
            tasks_completed: self.tasks_completed(),
            tasks_failed: self.tasks_failed(),
        }
    }
}

impl Drop for RebuildScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<RebuildTask>,
    semaphore: Arc<Semaphore>,
    mut shutdown_rx: broadcast::Receiver<()>,
    shared: Arc<Shared>,
) {
    loop {
        let permit = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let task = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            task = rx.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let span = tracing::info_span!("rebuild", key = %task.key);
        tokio::spawn(run_task(task, permit, shared.clone()).instrument(span));
    }

    info!(
        completed = shared.tasks_completed.load(Ordering::Relaxed),
        failed = shared.tasks_failed.load(Ordering::Relaxed),
        "Rebuild scheduler stopped"
    );
}

async fn run_task(task: RebuildTask, permit: OwnedSemaphorePermit, shared: Arc<Shared>) {
    let RebuildTask { key, lock_key, job } = task;
    debug!(key = %key, "Running rebuild");

    let started = Instant::now();
    let outcome = match timeout(shared.task_timeout, AssertUnwindSafe(job).catch_unwind()).await {
        Ok(Ok(Ok(()))) => RebuildOutcome::Completed,
        Ok(Ok(Err(e))) => RebuildOutcome::Failed(e.to_string()),
        Ok(Err(_)) => RebuildOutcome::Failed("rebuild task panicked".to_string()),
        Err(_) => RebuildOutcome::TimedOut,
    };
    let elapsed = started.elapsed();

    if let Some(lock_key) = &lock_key {
        shared.lock.unlock_quietly(lock_key).await;
    }
    drop(permit);

    match &outcome {
        RebuildOutcome::Completed => {
            debug!(key = %key, elapsed_ms = elapsed.as_millis() as u64, "Rebuild completed");
            shared.tasks_completed.fetch_add(1, Ordering::Relaxed);
        }
        RebuildOutcome::Failed(reason) => {
            error!(key = %key, error = %reason, "Rebuild failed");
            shared.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
        RebuildOutcome::TimedOut => {
            warn!(key = %key, timeout = ?shared.task_timeout, "Rebuild timed out");
            shared.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
    RebuildMetrics::finished(outcome.label(), elapsed);

    // No subscribers is fine.
    let _ = shared.events.send(RebuildEvent {
        key,
        outcome,
        elapsed,
    });
}
