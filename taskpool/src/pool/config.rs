use std::time::Duration;

use crate::pool::error::PoolError;

pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_TASK_COUNT: usize = 10;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FORCE_STOP_GRACE: Duration = Duration::from_secs(1);
pub const DEFAULT_WORK_DURATION: Duration = Duration::from_secs(1);

// --- Pool Configuration ---

/// Configuration for the `WorkerPool`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// The fixed number of workers, all running concurrently.
    pub worker_count: usize,

    /// How long the coordinator waits for every worker to finish on its own.
    pub shutdown_timeout: Duration,

    /// After cancelling, how long stragglers get to observe the cancellation
    /// before they are aborted on the runtime.
    pub force_stop_grace: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            force_stop_grace: DEFAULT_FORCE_STOP_GRACE,
        }
    }
}

impl PoolConfig {
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn with_force_stop_grace(mut self, force_stop_grace: Duration) -> Self {
        self.force_stop_grace = force_stop_grace;
        self
    }

    /// Checks the values a pool cannot run with.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.worker_count == 0 {
            return Err(PoolError::InvalidConfig("worker_count must be at least 1".to_string()));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(PoolError::InvalidConfig(
                "shutdown_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
