// Taskpool
//
// A fixed pool of workers draining a shared task queue, writing one result
// line per completed task, under a bounded-time coordinated shutdown.

pub mod logging;
pub mod pool;
pub mod signal;

// Re-export commonly used types
pub use pool::*;
pub use taskpool_api::{
    ProcessError, ResultSink, SinkError, Task, TaskProcessor, TaskResult, synthetic_tasks,
};
