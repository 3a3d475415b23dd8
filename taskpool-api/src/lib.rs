//! # Taskpool API
//!
//! Vocabulary shared between the taskpool core and its external collaborators.
//!
//! The core drains a bounded set of [`Task`]s with a fixed pool of workers.
//! Everything the core does not own is expressed here as a trait:
//!
//! - **Task feed**: any iterator of [`Task`], for example [`synthetic_tasks`]
//! - **Processing**: [`TaskProcessor`], the cancellable per-task work
//! - **Result destination**: [`ResultSink`], a serialized line appender
//!
//! ## Module Organization
//!
//! - [`task`]: tasks and result lines
//! - [`sink`]: the result sink trait
//! - [`processor`]: the processing step trait
//! - [`errors`]: collaborator error types

pub mod errors;
pub mod processor;
pub mod sink;
pub mod task;

pub use errors::{ProcessError, SinkError};
pub use processor::TaskProcessor;
pub use sink::ResultSink;
pub use task::{synthetic_tasks, Task, TaskResult};
