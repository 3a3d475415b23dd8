use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use taskpool_api::{ProcessError, Task, TaskProcessor};

/// Simulated processing: holds the worker for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWork {
    duration: Duration,
}

impl SimulatedWork {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl TaskProcessor for SimulatedWork {
    async fn process(&self, _task: &Task, cancel: &CancellationToken) -> Result<(), ProcessError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProcessError::Interrupted),
            _ = tokio::time::sleep(self.duration) => Ok(()),
        }
    }
}
