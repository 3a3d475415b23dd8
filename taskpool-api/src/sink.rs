//! # Result Sink Interface
//!
//! Append-only, line-oriented destination for completed-task results.
//!
//! Implementations must serialize concurrent appends so the bytes of two lines
//! never interleave, and a line must be fully written (flushed) before
//! `append` returns `Ok`.

use async_trait::async_trait;

use crate::errors::SinkError;

/// Serialized append-only writer shared by all workers.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Appends a single line. The implementation adds the line delimiter.
    ///
    /// # Errors
    /// Returns [`SinkError`] when the line could not be made durable. The
    /// caller decides what to do; the sink does not retry.
    async fn append(&self, line: &str) -> Result<(), SinkError>;
}
