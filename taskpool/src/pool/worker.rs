use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use taskpool_api::{ProcessError, ResultSink, TaskProcessor, TaskResult};

use crate::pool::queue::SharedQueue;
use crate::worker_span;

/// # Worker Implementation
///
/// A unit of execution that drains the shared queue, processes each task and
/// appends one result line per completed task.
///
/// ## Key Responsibilities
/// - Pulling tasks until the queue reports empty
/// - Running the cancellable processing step
/// - Writing results through the shared sink
/// - Containing every failure at the worker boundary
///
/// ## Implementation Details
/// ### Core Algorithm
/// 1. Check the cancellation token
/// 2. Dequeue; an empty queue ends the worker normally
/// 3. Race the processing step against the token
/// 4. Count the task and append its result; a failed append is logged and
///    the loop continues
///
/// ### Exit Paths
/// - `Drained`: the queue was empty
/// - `Interrupted`: cancellation was observed; an in-flight task is dropped
///   without a result line and is not requeued
/// - `Errored`: the processor failed or something panicked
///
/// Whatever the path, the final tally is logged exactly once, including when
/// the worker's future is dropped by a forced abort.
pub struct Worker {
    /// 1-based worker identity, used in result lines
    id: usize,

    /// Queue shared with the coordinator and sibling workers
    queue: Arc<SharedQueue>,

    /// Destination for result lines
    sink: Arc<dyn ResultSink>,

    /// Per-task work
    processor: Arc<dyn TaskProcessor>,

    /// Cancellation signal from the coordinator
    cancel: CancellationToken,

    /// Current state, owned by this worker only
    state: WorkerState,

    /// Counters, written by this worker only
    progress: Arc<WorkerProgress>,
}

/// Terminal status of a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue was empty
    Drained,
    /// Cancellation was observed
    Interrupted,
    /// An unexpected failure ended the loop
    Errored { reason: String },
}

/// States a worker moves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Started,
    Looping,
    Processing,
    Exited(WorkerExit),
}

/// Live counters of one worker.
///
/// Only the worker writes them. The coordinator keeps a handle so a worker
/// that is aborted before handing back its report is still accounted for.
#[derive(Debug, Default)]
pub struct WorkerProgress {
    completed: AtomicUsize,
    write_failures: AtomicUsize,
}

impl WorkerProgress {
    /// Tasks whose processing completed so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Result lines that could not be written so far
    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Acquire)
    }
}

/// What a worker hands back to the coordinator once it has terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    /// Tasks whose processing completed, whether or not the write succeeded
    pub completed: usize,
    /// Result lines that could not be written
    pub write_failures: usize,
    pub exit: WorkerExit,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Worker {
    /// Creates a worker.
    ///
    /// ## Parameters
    /// - `id`: 1-based worker identity
    /// - `queue`: queue to drain
    /// - `sink`: destination for result lines
    /// - `processor`: per-task work
    /// - `cancel`: token the coordinator fires to stop the worker
    pub fn new(
        id: usize,
        queue: Arc<SharedQueue>,
        sink: Arc<dyn ResultSink>,
        processor: Arc<dyn TaskProcessor>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            queue,
            sink,
            processor,
            cancel,
            state: WorkerState::Started,
            progress: Arc::new(WorkerProgress::default()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Handle on this worker's counters, valid after the worker is gone.
    pub fn progress(&self) -> Arc<WorkerProgress> {
        Arc::clone(&self.progress)
    }

    /// Runs the worker to one of its terminal states.
    pub async fn run(self) -> WorkerReport {
        let span = worker_span!(self.id);
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> WorkerReport {
        let mut tally = Tally::new(self.id, self.progress());
        info!("Worker {} started", self.id);

        let outcome = AssertUnwindSafe(self.drain(&mut tally)).catch_unwind().await;
        let exit = match outcome {
            Ok(exit) => exit,
            Err(panic) => {
                let reason = panic_message(panic);
                error!(reason = %reason, "Worker {} encountered unexpected error", self.id);
                WorkerExit::Errored { reason }
            }
        };

        self.transition(WorkerState::Exited(exit.clone()));
        tally.finish(exit)
    }

    async fn drain(&mut self, tally: &mut Tally) -> WorkerExit {
        loop {
            self.transition(WorkerState::Looping);

            if self.cancel.is_cancelled() {
                warn!("Worker {} observed cancellation, exiting", self.id);
                return WorkerExit::Interrupted;
            }

            let Some(task) = self.queue.dequeue() else {
                info!("Worker {} found no more tasks in queue, exiting", self.id);
                return WorkerExit::Drained;
            };

            self.transition(WorkerState::Processing);
            info!(task = %task, "Worker {} is processing task", self.id);

            let processed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ProcessError::Interrupted),
                result = self.processor.process(&task, &self.cancel) => result,
            };

            match processed {
                Ok(()) => {}
                Err(ProcessError::Interrupted) => {
                    warn!(
                        task = %task,
                        "Worker {} was interrupted during processing, task dropped", self.id
                    );
                    return WorkerExit::Interrupted;
                }
                Err(ProcessError::Failed(reason)) => {
                    error!(
                        task = %task,
                        reason = %reason,
                        "Worker {} encountered unexpected error", self.id
                    );
                    return WorkerExit::Errored { reason };
                }
            }

            tally.record_completed();
            let result = TaskResult::new(self.id, task);
            match self.sink.append(&result.to_line()).await {
                Ok(()) => debug!(task = %result.task, "Worker {} saved result", self.id),
                Err(e) => {
                    tally.record_write_failure();
                    error!(
                        error = %e,
                        "Worker {} encountered error while writing results", self.id
                    );
                }
            }
        }
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Worker {} state change", self.id);
            self.state = next;
        }
    }
}

/// Updates a worker's counters. Logs the final tally once, on `finish` or on
/// drop.
struct Tally {
    worker_id: usize,
    progress: Arc<WorkerProgress>,
    reported: bool,
}

impl Tally {
    fn new(worker_id: usize, progress: Arc<WorkerProgress>) -> Self {
        Self {
            worker_id,
            progress,
            reported: false,
        }
    }

    fn record_completed(&mut self) {
        self.progress.completed.fetch_add(1, Ordering::AcqRel);
    }

    fn record_write_failure(&mut self) {
        self.progress.write_failures.fetch_add(1, Ordering::AcqRel);
    }

    fn finish(&mut self, exit: WorkerExit) -> WorkerReport {
        self.reported = true;
        let completed = self.progress.completed();
        let write_failures = self.progress.write_failures();
        info!(
            exit = ?exit,
            write_failures,
            "Worker {} completed {} tasks and is terminating",
            self.worker_id,
            completed
        );
        WorkerReport {
            worker_id: self.worker_id,
            completed,
            write_failures,
            exit,
        }
    }
}

impl Drop for Tally {
    fn drop(&mut self) {
        if !self.reported {
            warn!(
                worker_id = self.worker_id,
                write_failures = self.progress.write_failures(),
                "Worker {} was aborted after completing {} tasks and is terminating",
                self.worker_id,
                self.progress.completed()
            );
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "worker panicked".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "worker panicked");
    }

    #[test]
    fn test_tally_reports_counts() {
        let progress = Arc::new(WorkerProgress::default());
        let mut tally = Tally::new(4, Arc::clone(&progress));
        tally.record_completed();
        tally.record_completed();
        tally.record_completed();
        tally.record_write_failure();
        assert_eq!(progress.completed(), 3);
        let report = tally.finish(WorkerExit::Drained);
        assert_eq!(
            report,
            WorkerReport {
                worker_id: 4,
                completed: 3,
                write_failures: 1,
                exit: WorkerExit::Drained,
            }
        );
    }
}
