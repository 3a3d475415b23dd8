//! # Collaborator Error Types
//!
//! Errors raised by the pluggable collaborators a worker calls into. None of
//! them is fatal to the pool: workers log them and decide locally whether to
//! keep looping.
//!
//! - [`SinkError`]: a result line could not be appended. The worker logs it
//!   and moves on to the next task.
//! - [`ProcessError`]: the processing step was interrupted or failed. An
//!   interruption ends the worker as interrupted, a failure ends it as errored.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to append a result line.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O failure while opening, writing or flushing the destination.
    #[error("Failed to append to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The line carries a line delimiter and would not land as one record.
    #[error("Refusing to append a line containing a line break: {line:?}")]
    MalformedLine { line: String },

    /// The sink no longer accepts writes.
    #[error("Result sink is closed")]
    Closed,
}

impl SinkError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of a processing step that did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Cancellation was observed while the task was in flight.
    #[error("Processing interrupted")]
    Interrupted,

    /// Any other failure. Terminal for the worker that hit it.
    #[error("Processing failed: {0}")]
    Failed(String),
}
