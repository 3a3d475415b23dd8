//! # Tasks and Results
//!
//! A [`Task`] is the opaque unit of work handed from the shared queue to exactly
//! one worker. A [`TaskResult`] is the record that a given worker completed a
//! given task; it is rendered as one line in the result destination.
//!
//! ## Usage Example
//!
//! ```rust
//! use taskpool_api::task::{Task, TaskResult};
//!
//! let task = Task::new("Task 1");
//! let result = TaskResult::new(3, task);
//! assert_eq!(result.to_line(), "Worker 3 completed task: Task 1");
//!
//! let parsed = TaskResult::parse_line(&result.to_line()).unwrap();
//! assert_eq!(parsed.worker_id, 3);
//! ```

use std::fmt;

/// Opaque unit of work.
///
/// Immutable once created. Ownership moves from the queue to the worker that
/// dequeues it, so no other component can observe it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    payload: String,
}

impl Task {
    /// Creates a task from any string-like payload.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The task descriptor.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Empty tasks are never accepted by a queue.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

impl From<&str> for Task {
    fn from(payload: &str) -> Self {
        Task::new(payload)
    }
}

impl From<String> for Task {
    fn from(payload: String) -> Self {
        Task::new(payload)
    }
}

/// Builds the default synthetic feed: `"Task 1"` through `"Task {count}"`.
pub fn synthetic_tasks(count: usize) -> impl Iterator<Item = Task> {
    (1..=count).map(|i| Task::new(format!("Task {i}")))
}

const LINE_PREFIX: &str = "Worker ";
const LINE_SEPARATOR: &str = " completed task: ";

/// Durable record that `task` was completed by worker `worker_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// 1-based identity of the worker that processed the task.
    pub worker_id: usize,
    /// The processed task.
    pub task: Task,
}

impl TaskResult {
    pub fn new(worker_id: usize, task: Task) -> Self {
        Self { worker_id, task }
    }

    /// Renders the result as a single line, without the trailing newline.
    ///
    /// Line breaks and backslashes in the payload are escaped, so any task
    /// renders as exactly one line.
    pub fn to_line(&self) -> String {
        format!(
            "{LINE_PREFIX}{}{LINE_SEPARATOR}{}",
            self.worker_id,
            escape_payload(self.task.payload())
        )
    }

    /// Parses a line produced by [`TaskResult::to_line`].
    ///
    /// Returns `None` for anything that is not a whole result line, which makes
    /// it suitable for detecting torn or interleaved writes.
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(LINE_PREFIX)?;
        let (id, task) = rest.split_once(LINE_SEPARATOR)?;
        let worker_id = id.parse().ok()?;
        if task.is_empty() || task.contains(['\n', '\r']) {
            return None;
        }
        Some(Self::new(worker_id, Task::new(unescape_payload(task)?)))
    }
}

fn escape_payload(payload: &str) -> String {
    let mut escaped = String::with_capacity(payload.len());
    for c in payload.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_payload(escaped: &str) -> Option<String> {
    let mut payload = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            payload.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => payload.push('\\'),
            'n' => payload.push('\n'),
            'r' => payload.push('\r'),
            _ => return None,
        }
    }
    Some(payload)
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
