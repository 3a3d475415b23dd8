//! # Worker Pool Module
//!
//! The concurrent core: a shared task queue drained by a fixed pool of
//! workers, results written through a serialized sink, and a coordinator that
//! bounds the whole run with a deadline.
//!
//! ## Key Concepts
//! - Drain until empty: an empty queue is the normal end of a worker
//! - Cooperative cancellation: workers poll a token every iteration and race
//!   their processing step against it
//! - Escalating shutdown: deadline, then cancellation, then abort
//!
//! ## Components
//! - [`SharedQueue`]: lock-free FIFO of pending tasks
//! - [`FileSink`] / [`MemorySink`]: result sinks
//! - [`SimulatedWork`]: the default processing step
//! - [`Worker`]: drains the queue until it is empty or cancelled
//! - [`WorkerPool`]: seeds, launches and shuts down the workers

pub mod config;
pub mod coordinator;
pub mod error;
pub mod processor;
pub mod queue;
pub mod sink;
pub mod worker;

pub use config::PoolConfig;
pub use coordinator::{PoolOutcome, PoolReport, PoolStatus, SeedSummary, WorkerPool, build_runtime};
pub use error::PoolError;
pub use processor::SimulatedWork;
pub use queue::SharedQueue;
pub use sink::{FileSink, MemorySink};
pub use worker::{Worker, WorkerExit, WorkerProgress, WorkerReport, WorkerState};
