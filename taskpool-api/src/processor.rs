//! # Task Processor Interface
//!
//! The processing step a worker performs for each dequeued task. This is the
//! only intentional blocking point of a worker, so it receives the worker's
//! cancellation token and must return [`ProcessError::Interrupted`] promptly
//! once the token fires.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ProcessError;
use crate::task::Task;

/// Externally supplied work performed for one task.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    /// Processes `task`.
    ///
    /// Implementations poll `cancel` at their own checkpoints. Workers also
    /// race this future against the token, so a processor that never checks
    /// it is still dropped on cancellation.
    async fn process(&self, task: &Task, cancel: &CancellationToken) -> Result<(), ProcessError>;
}
