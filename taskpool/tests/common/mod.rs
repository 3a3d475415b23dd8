// Shared fixtures for taskpool integration tests
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use taskpool::{ProcessError, ResultSink, SinkError, Task, TaskProcessor};

/// A fresh, not yet existing file path under the system temp directory
pub fn temp_output() -> PathBuf {
    std::env::temp_dir().join(format!("taskpool-{}.txt", uuid::Uuid::new_v4()))
}

/// Lines of `path`, or nothing if it was never created
pub fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => panic!("failed to read {}: {e}", path.display()),
    }
}

/// Every append fails
pub struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn append(&self, _line: &str) -> Result<(), SinkError> {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        Err(SinkError::io("unwritable.txt", denied))
    }
}

/// Every append hangs forever and ignores cancellation
pub struct HangingSink;

#[async_trait]
impl ResultSink for HangingSink {
    async fn append(&self, _line: &str) -> Result<(), SinkError> {
        std::future::pending().await
    }
}

/// Completes instantly except for one payload, which fails
pub struct FailOn(pub &'static str);

#[async_trait]
impl TaskProcessor for FailOn {
    async fn process(&self, task: &Task, _cancel: &CancellationToken) -> Result<(), ProcessError> {
        if task.payload() == self.0 {
            return Err(ProcessError::Failed(format!("cannot process {task}")));
        }
        Ok(())
    }
}

/// Completes instantly except for one payload, which panics
pub struct PanicOn(pub &'static str);

#[async_trait]
impl TaskProcessor for PanicOn {
    async fn process(&self, task: &Task, _cancel: &CancellationToken) -> Result<(), ProcessError> {
        if task.payload() == self.0 {
            panic!("processor exploded on {task}");
        }
        Ok(())
    }
}

/// Sleeps without ever looking at the token
pub struct Oblivious(pub Duration);

#[async_trait]
impl TaskProcessor for Oblivious {
    async fn process(&self, _task: &Task, _cancel: &CancellationToken) -> Result<(), ProcessError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

/// Completes instantly except for one payload, which waits for cancellation
pub struct BlockOn(pub &'static str);

#[async_trait]
impl TaskProcessor for BlockOn {
    async fn process(&self, task: &Task, cancel: &CancellationToken) -> Result<(), ProcessError> {
        if task.payload() == self.0 {
            cancel.cancelled().await;
            return Err(ProcessError::Interrupted);
        }
        Ok(())
    }
}
