// Logging System for Taskpool
//
// This module provides the logging collaborator of the worker pool. It is built
// on top of the `tracing` ecosystem: the core only emits structured events, and
// the subscriber installed here owns formatting and destinations.
//
// # Usage Examples
//
// ## Basic Initialization
//
// ```rust
// use taskpool::logging;
//
// // INFO level, console output
// logging::init(logging::LogConfig::default())?;
// ```
//
// ## Console and File
//
// ```rust
// use taskpool::logging::{self, LogConfig};
//
// let config = LogConfig {
//     file: Some("system.log".into()),
//     ..Default::default()
// };
// logging::init(config)?;
// ```
//
// ## Using the Span Macros
//
// ```rust
// let span = taskpool::worker_span!(3);
// let _guard = span.enter();
// taskpool::log_pool!("shutdown", "completed", workers = 5);
// ```

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::Layered, prelude::*};

/// Configuration for the logging collaborator
///
/// # Examples
///
/// ```rust
/// use taskpool::logging::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for console logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
    /// Optional append-mode log file, written in plain text
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: false,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
            file: None,
        }
    }
}

/// Errors raised while installing the logging collaborator
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid log filter directive '{0}'")]
    InvalidFilter(String),

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// Install the global subscriber described by `config`
///
/// Builds an `EnvFilter` (honouring `RUST_LOG`), a console layer and, when
/// `config.file` is set, a plain-text file layer.
///
/// # Errors
/// Fails if a filter directive does not parse, the log file cannot be opened,
/// or a global subscriber was installed earlier.
pub fn init(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = build_filter(&config)?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config)];
    if let Some(path) = &config.file {
        layers.push(file_layer(open_log_file(path)?));
    }

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layers);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize logging for tests
///
/// WARN level, compact output, and a second call is a no-op rather than an
/// error so every test can call it.
pub fn init_test() {
    let config = LogConfig {
        level: Level::WARN,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        ..Default::default()
    };
    let _ = init(config);
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter, LoggingError> {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let directive = filter
                .parse()
                .map_err(|_| LoggingError::InvalidFilter(filter.to_string()))?;
            env_filter = env_filter.add_directive(directive);
        }
    }

    Ok(env_filter)
}

fn console_layer(config: &LogConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info);

    match (config.json_format, config.show_time) {
        (true, _) => layer.json().flatten_event(true).boxed(),
        (false, true) => layer.boxed(),
        (false, false) => layer.without_time().boxed(),
    }
}

fn file_layer(file: File) -> BoxedLayer {
    fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_thread_names(true)
        .with_thread_ids(true)
        .boxed()
}

/// Opens `path` in create+append mode.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Create a span for everything a single worker does
///
/// # Examples
///
/// ```rust
/// let span = taskpool::worker_span!(2);
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! worker_span {
    ($worker_id:expr) => {
        tracing::info_span!("worker", worker_id = $worker_id)
    };
    ($worker_id:expr, $($fields:tt)*) => {
        tracing::info_span!("worker", worker_id = $worker_id, $($fields)*)
    };
}

/// Create a span for one coordinator run
#[macro_export]
macro_rules! pool_span {
    ($run_id:expr) => {
        tracing::info_span!("pool", run_id = %$run_id)
    };
    ($run_id:expr, $($fields:tt)*) => {
        tracing::info_span!("pool", run_id = %$run_id, $($fields)*)
    };
}

/// Log pool lifecycle events
///
/// # Examples
///
/// ```rust
/// taskpool::log_pool!("seed", "completed", accepted = 10);
/// ```
#[macro_export]
macro_rules! log_pool {
    ($operation:expr, $status:expr) => {
        tracing::info!(operation = $operation, status = $status);
    };
    ($operation:expr, $status:expr, $($fields:tt)*) => {
        tracing::info!(operation = $operation, status = $status, $($fields)*);
    };
}
