use thiserror::Error;

/// Errors related to the worker pool itself.
///
/// Individual task and worker failures are not represented here; they are
/// recovered inside the worker and only show up in logs and reports.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
    #[error("Worker pool has already been started")]
    AlreadyStarted,
    #[error("Failed to build worker runtime: {0}")]
    Runtime(String),
}
