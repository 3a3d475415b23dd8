use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use taskpool_api::{ResultSink, SinkError};

/// Appends result lines to a file.
///
/// Every append holds the sink's lock for the whole open/write/flush/close
/// sequence, so lines from concurrent workers never interleave. The guard is
/// scoped to the call and released on every return path.
///
/// A line containing `\n` or `\r` is rejected with
/// [`SinkError::MalformedLine`] before the file is touched.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSink {
    /// Creates a sink for `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn append(&self, line: &str) -> Result<(), SinkError> {
        if line.contains(['\n', '\r']) {
            return Err(SinkError::MalformedLine {
                line: line.to_string(),
            });
        }

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        file.write_all(record.as_bytes())
            .await
            .map_err(|e| SinkError::io(&self.path, e))?;
        file.flush().await.map_err(|e| SinkError::io(&self.path, e))?;

        debug!(path = %self.path.display(), line, "Wrote result");
        Ok(())
    }
}

/// Keeps result lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line appended so far, in append order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, line: &str) -> Result<(), SinkError> {
        let mut lines = self.lines.lock().map_err(|_| SinkError::Closed)?;
        lines.push(line.to_string());
        Ok(())
    }
}
