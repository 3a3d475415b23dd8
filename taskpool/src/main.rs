// Taskpool binary
//
// Seeds a synthetic task feed, drains it with a fixed pool of workers and
// writes one line per completed task. Timeouts and interruptions are logged,
// not turned into a failing exit status; only startup errors exit non-zero.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};

use taskpool::logging::{self, LogConfig};
use taskpool::pool::config::{DEFAULT_TASK_COUNT, DEFAULT_WORKER_COUNT};
use taskpool::signal::wait_for_shutdown_signal;
use taskpool::{
    FileSink, PoolConfig, PoolOutcome, SharedQueue, SimulatedWork, WorkerPool, build_runtime,
    synthetic_tasks,
};

#[derive(Parser, Debug)]
#[command(name = "taskpool")]
#[command(about = "Drain a queue of tasks with a fixed pool of concurrent workers")]
#[command(version)]
struct Cli {
    /// Number of concurrent workers
    #[arg(long, env = "TASKPOOL_WORKERS", default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,

    /// Number of synthetic tasks to seed
    #[arg(long, env = "TASKPOOL_TASKS", default_value_t = DEFAULT_TASK_COUNT)]
    tasks: usize,

    /// Simulated processing time per task, in seconds
    #[arg(long, env = "TASKPOOL_WORK_SECS", default_value_t = 1.0)]
    work_secs: f64,

    /// How long to wait for all workers before cancelling them, in seconds
    #[arg(long, env = "TASKPOOL_TIMEOUT_SECS", default_value_t = 30.0)]
    timeout_secs: f64,

    /// How long cancelled workers get before being aborted, in seconds
    #[arg(long, env = "TASKPOOL_GRACE_SECS", default_value_t = 1.0)]
    grace_secs: f64,

    /// File result lines are appended to
    #[arg(long, env = "TASKPOOL_OUTPUT", default_value = "output.txt")]
    output: PathBuf,

    /// File log lines are appended to
    #[arg(long, env = "TASKPOOL_LOG_FILE", default_value = "system.log")]
    log_file: PathBuf,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,

    /// Minimum log level
    #[arg(long, env = "TASKPOOL_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Emit console logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level,
            json_format: self.json_logs,
            file: (!self.no_log_file).then(|| self.log_file.clone()),
            ..Default::default()
        }
    }

    fn pool_config(&self) -> anyhow::Result<PoolConfig> {
        Ok(PoolConfig::default()
            .with_worker_count(self.workers)
            .with_shutdown_timeout(seconds(self.timeout_secs, "timeout-secs")?)
            .with_force_stop_grace(seconds(self.grace_secs, "grace-secs")?))
    }
}

fn seconds(value: f64, flag: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("--{flag} must be a non-negative number of seconds, got {value}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_config()).context("failed to initialize logging")?;
    info!("Taskpool starting up");

    let config = cli.pool_config()?;
    let grace = config.force_stop_grace;
    let runtime = build_runtime(&config)?;

    let pool = WorkerPool::new(
        config,
        Arc::new(SharedQueue::new()),
        Arc::new(FileSink::new(&cli.output)),
        Arc::new(SimulatedWork::new(seconds(cli.work_secs, "work-secs")?)),
        runtime.handle().clone(),
    )?;
    pool.seed(synthetic_tasks(cli.tasks))?;

    let report = runtime.block_on(async {
        let interrupt = CancellationToken::new();
        let trigger = interrupt.clone();
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => {
                    warn!("Shutdown signal received");
                    trigger.cancel();
                }
                Err(e) => error!(error = %e, "Failed to install signal handlers"),
            }
        });
        pool.run(interrupt).await
    })?;

    match report.outcome {
        PoolOutcome::AllCompleted => info!(
            tasks_completed = report.tasks_completed(),
            "Processed every task"
        ),
        PoolOutcome::TimedOut | PoolOutcome::Interrupted => warn!(
            outcome = %report.outcome,
            tasks_completed = report.tasks_completed(),
            tasks_remaining = report.tasks_remaining,
            "Run ended early"
        ),
    }

    runtime.shutdown_timeout(grace);
    info!("Taskpool shutting down");
    Ok(())
}
