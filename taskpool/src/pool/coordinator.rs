use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::task::{JoinError, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use taskpool_api::{ResultSink, Task, TaskProcessor};

use super::config::PoolConfig;
use super::error::PoolError;
use super::queue::SharedQueue;
use super::worker::{Worker, WorkerProgress, WorkerReport};
use crate::{log_pool, pool_span};

/// Status codes for the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Accepting seed tasks, no worker launched yet
    Initializing = 0,

    /// Workers are being launched
    Running = 1,

    /// All workers submitted, waiting for them to terminate
    ShuttingDown = 2,

    /// Every worker has terminated or been abandoned
    Shutdown = 3,
}

impl PoolStatus {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => PoolStatus::Initializing,
            1 => PoolStatus::Running,
            2 => PoolStatus::ShuttingDown,
            _ => PoolStatus::Shutdown,
        }
    }
}

/// How the coordinator's wait for its workers ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOutcome {
    /// Every worker terminated before the deadline
    AllCompleted,
    /// The deadline elapsed first; remaining workers were cancelled
    TimedOut,
    /// The wait itself was interrupted; remaining workers were cancelled
    Interrupted,
}

impl PoolOutcome {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolOutcome::AllCompleted => "all_completed",
            PoolOutcome::TimedOut => "timed_out",
            PoolOutcome::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for PoolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Result of seeding the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Final record of one pool run
#[derive(Debug, Clone)]
pub struct PoolReport {
    /// Correlates every log line of the run
    pub run_id: Uuid,

    /// Configured number of workers
    pub worker_count: usize,

    /// Configured shutdown deadline
    pub shutdown_timeout: Duration,

    pub outcome: PoolOutcome,

    /// Reports of the workers that terminated on their own, sorted by id
    pub workers: Vec<WorkerReport>,

    /// Workers that were aborted or abandoned after the grace period
    pub aborted: usize,

    /// Tasks completed by workers that never handed back a report (aborted,
    /// abandoned or panicked). Read when the report is built; an abandoned
    /// worker may still be running at that point.
    pub aborted_completed: usize,

    /// Result lines those same workers failed to write
    pub aborted_write_failures: usize,

    /// Workers whose task panicked outside the worker's own recovery
    pub panicked: usize,

    /// Tasks still queued when the run ended
    pub tasks_remaining: usize,
}

impl PoolReport {
    /// Tasks completed by every worker, including aborted ones
    pub fn tasks_completed(&self) -> usize {
        self.workers.iter().map(|w| w.completed).sum::<usize>() + self.aborted_completed
    }

    /// Failed result writes across every worker, including aborted ones
    pub fn write_failures(&self) -> usize {
        self.workers.iter().map(|w| w.write_failures).sum::<usize>() + self.aborted_write_failures
    }
}

/// Pool coordinator
///
/// Seeds the shared queue, launches a fixed number of workers onto a runtime
/// and performs a timed, escalating shutdown.
///
/// # Shutdown Sequence
/// 1. Launch `worker_count` workers, then stop accepting seed tasks
/// 2. Wait up to `shutdown_timeout` for every worker to terminate
/// 3. On timeout or interruption, cancel all workers
/// 4. Wait up to `force_stop_grace` for them to observe the cancellation
/// 5. Abort whatever is left on the runtime, and abandon it after another grace period
///
/// The coordinator never retries a worker and never requeues a dropped task.
pub struct WorkerPool {
    run_id: Uuid,

    config: PoolConfig,

    queue: Arc<SharedQueue>,

    sink: Arc<dyn ResultSink>,

    processor: Arc<dyn TaskProcessor>,

    /// Runtime the workers are spawned on
    runtime_handle: Handle,

    /// Current status of the pool
    status: Arc<AtomicUsize>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("status", &self.status())
            .finish()
    }
}

impl WorkerPool {
    /// Create a new pool
    ///
    /// # Arguments
    /// * `config` - Pool configuration, validated here
    /// * `queue` - Queue the workers drain
    /// * `sink` - Destination for result lines
    /// * `processor` - Per-task work
    /// * `runtime_handle` - Runtime the workers run on
    pub fn new(
        config: PoolConfig,
        queue: Arc<SharedQueue>,
        sink: Arc<dyn ResultSink>,
        processor: Arc<dyn TaskProcessor>,
        runtime_handle: Handle,
    ) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            queue,
            sink,
            processor,
            runtime_handle,
            status: Arc::new(AtomicUsize::new(PoolStatus::Initializing as usize)),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<SharedQueue> {
        &self.queue
    }

    /// Get the current pool status
    pub fn status(&self) -> PoolStatus {
        PoolStatus::from_usize(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, status: PoolStatus) {
        self.status.store(status as usize, Ordering::SeqCst);
    }

    /// Enqueue the initial tasks, in order
    ///
    /// Only allowed before [`WorkerPool::run`]; once workers are launched the
    /// queue receives no further writes.
    pub fn seed<I>(&self, tasks: I) -> Result<SeedSummary, PoolError>
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        if self.status() != PoolStatus::Initializing {
            return Err(PoolError::AlreadyStarted);
        }

        info!(run_id = %self.run_id, "Adding tasks to the queue");
        let mut summary = SeedSummary::default();
        for task in tasks {
            if self.queue.enqueue(task) {
                summary.accepted += 1;
            } else {
                summary.rejected += 1;
            }
        }

        log_pool!("seed", "completed", accepted = summary.accepted, rejected = summary.rejected);
        Ok(summary)
    }

    /// Launch the workers and drive them to shutdown
    ///
    /// `interrupt` interrupts the coordinator's own wait. An interrupted run is
    /// reported through [`PoolOutcome::Interrupted`], after the same forced
    /// cancellation a timeout gets.
    ///
    /// # Errors
    /// [`PoolError::AlreadyStarted`] if the pool was run before.
    pub async fn run(&self, interrupt: CancellationToken) -> Result<PoolReport, PoolError> {
        self.status
            .compare_exchange(
                PoolStatus::Initializing as usize,
                PoolStatus::Running as usize,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| PoolError::AlreadyStarted)?;

        let span = pool_span!(self.run_id, workers = self.config.worker_count);
        Ok(self.drive(interrupt).instrument(span).await)
    }

    async fn drive(&self, interrupt: CancellationToken) -> PoolReport {
        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();
        let mut collected = Collected::default();

        info!("Launching {} workers", self.config.worker_count);
        let progress = self.start_workers(&mut set, &cancel);

        self.set_status(PoolStatus::ShuttingDown);
        info!("All workers submitted, initiating graceful shutdown");

        let deadline = self.config.shutdown_timeout;
        let outcome = tokio::select! {
            biased;
            _ = interrupt.cancelled() => PoolOutcome::Interrupted,
            finished = time::timeout(deadline, collected.drain(&mut set)) => match finished {
                Ok(()) => PoolOutcome::AllCompleted,
                Err(_) => PoolOutcome::TimedOut,
            },
        };

        match outcome {
            PoolOutcome::AllCompleted => info!("All workers completed successfully"),
            PoolOutcome::TimedOut => {
                warn!(timeout = ?deadline, "Timeout reached while waiting for workers to complete");
                self.force_stop(&cancel, &mut set, &mut collected).await;
            }
            PoolOutcome::Interrupted => {
                error!("Coordinator was interrupted while waiting for workers");
                self.force_stop(&cancel, &mut set, &mut collected).await;
            }
        }

        self.set_status(PoolStatus::Shutdown);
        let report = collected.into_report(self, outcome, &progress);
        log_pool!(
            "shutdown",
            outcome.as_label(),
            tasks_completed = report.tasks_completed(),
            write_failures = report.write_failures(),
            aborted = report.aborted,
            tasks_remaining = report.tasks_remaining
        );
        report
    }

    /// Spawn exactly `worker_count` workers, ids starting at 1
    ///
    /// Returns a handle on each worker's counters, keyed by worker id.
    fn start_workers(
        &self,
        set: &mut JoinSet<WorkerReport>,
        cancel: &CancellationToken,
    ) -> Vec<(usize, Arc<WorkerProgress>)> {
        let mut progress = Vec::with_capacity(self.config.worker_count);
        for worker_id in 1..=self.config.worker_count {
            let worker = Worker::new(
                worker_id,
                Arc::clone(&self.queue),
                Arc::clone(&self.sink),
                Arc::clone(&self.processor),
                cancel.child_token(),
            );
            progress.push((worker_id, worker.progress()));
            set.spawn_on(worker.run(), &self.runtime_handle);
        }
        progress
    }

    /// Cancel every worker, then abort and finally abandon stragglers
    async fn force_stop(
        &self,
        cancel: &CancellationToken,
        set: &mut JoinSet<WorkerReport>,
        collected: &mut Collected,
    ) {
        cancel.cancel();
        let grace = self.config.force_stop_grace;

        if time::timeout(grace, collected.drain(set)).await.is_ok() {
            return;
        }

        warn!(stuck = set.len(), grace = ?grace, "Workers ignored cancellation, aborting");
        set.abort_all();

        if time::timeout(grace, collected.drain(set)).await.is_err() {
            let abandoned = set.len();
            error!(abandoned, "Workers did not stop after abort, abandoning them");
            collected.aborted += abandoned;
            set.detach_all();
        }
    }
}

/// Build the bounded runtime the workers run on: one thread per worker
pub fn build_runtime(config: &PoolConfig) -> Result<Runtime, PoolError> {
    config.validate()?;
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_count)
        .thread_name("taskpool-worker")
        .enable_all()
        .build()
        .map_err(|e| PoolError::Runtime(e.to_string()))
}

/// Worker outcomes gathered from the join set
#[derive(Default)]
struct Collected {
    reports: Vec<WorkerReport>,
    aborted: usize,
    panicked: usize,
}

impl Collected {
    /// Joins until the set is empty. Safe to cancel between joins.
    async fn drain(&mut self, set: &mut JoinSet<WorkerReport>) {
        while let Some(joined) = set.join_next().await {
            self.absorb(joined);
        }
    }

    fn absorb(&mut self, joined: Result<WorkerReport, JoinError>) {
        match joined {
            Ok(report) => self.reports.push(report),
            Err(e) if e.is_cancelled() => self.aborted += 1,
            Err(e) => {
                error!(error = %e, "Worker task panicked");
                self.panicked += 1;
            }
        }
    }

    fn into_report(
        mut self,
        pool: &WorkerPool,
        outcome: PoolOutcome,
        progress: &[(usize, Arc<WorkerProgress>)],
    ) -> PoolReport {
        self.reports.sort_by_key(|r| r.worker_id);

        // Workers without a report never got to finish; their counters are
        // all that is left of them.
        let unreported = progress
            .iter()
            .filter(|(id, _)| !self.reports.iter().any(|r| r.worker_id == *id))
            .map(|(_, p)| p);
        let (aborted_completed, aborted_write_failures) = unreported
            .fold((0, 0), |(c, f), p| (c + p.completed(), f + p.write_failures()));

        PoolReport {
            run_id: pool.run_id,
            worker_count: pool.config.worker_count,
            shutdown_timeout: pool.config.shutdown_timeout,
            outcome,
            workers: self.reports,
            aborted: self.aborted,
            aborted_completed,
            aborted_write_failures,
            panicked: self.panicked,
            tasks_remaining: pool.queue.len(),
        }
    }
}
