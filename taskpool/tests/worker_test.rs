// Integration tests for taskpool::Worker

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use taskpool::logging;
use taskpool::{
    MemorySink, ResultSink, SharedQueue, SimulatedWork, Task, TaskProcessor, TaskResult, Worker,
    WorkerExit, WorkerState, synthetic_tasks,
};

mod common;

fn seeded_queue(count: usize) -> Arc<SharedQueue> {
    let queue = Arc::new(SharedQueue::new());
    for task in synthetic_tasks(count) {
        queue.enqueue(task);
    }
    queue
}

fn worker(
    id: usize,
    queue: &Arc<SharedQueue>,
    sink: Arc<dyn ResultSink>,
    processor: Arc<dyn TaskProcessor>,
    cancel: &CancellationToken,
) -> Worker {
    Worker::new(id, Arc::clone(queue), sink, processor, cancel.clone())
}

fn instant() -> Arc<dyn TaskProcessor> {
    Arc::new(SimulatedWork::new(Duration::ZERO))
}

#[tokio::test]
async fn test_worker_drains_queue_and_writes_every_result() {
    logging::init_test();
    let queue = seeded_queue(3);
    let sink = Arc::new(MemorySink::new());
    let cancel = CancellationToken::new();

    let w = worker(2, &queue, sink.clone(), instant(), &cancel);
    assert_eq!(w.id(), 2);
    assert_eq!(w.state(), &WorkerState::Started);

    let report = w.run().await;
    assert_eq!(report.worker_id, 2);
    assert_eq!(report.exit, WorkerExit::Drained);
    assert_eq!(report.completed, 3);
    assert_eq!(report.write_failures, 0);
    assert!(queue.is_empty());

    let expected: Vec<String> = synthetic_tasks(3)
        .map(|task| TaskResult::new(2, task).to_line())
        .collect();
    assert_eq!(sink.lines(), expected);
}

#[tokio::test]
async fn test_worker_on_empty_queue_exits_immediately() {
    let queue = Arc::new(SharedQueue::new());
    let sink = Arc::new(MemorySink::new());

    let report = worker(1, &queue, sink.clone(), instant(), &CancellationToken::new()).run().await;
    assert_eq!(report.exit, WorkerExit::Drained);
    assert_eq!(report.completed, 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_cancelled_mid_processing_writes_nothing_for_in_flight_task() {
    logging::init_test();
    let queue = seeded_queue(3);
    let sink = Arc::new(MemorySink::new());
    let cancel = CancellationToken::new();
    let processor = Arc::new(SimulatedWork::new(Duration::from_secs(30)));

    let handle = tokio::spawn(worker(1, &queue, sink.clone(), processor, &cancel).run());
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    cancel.cancel();
    let report = handle.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.exit, WorkerExit::Interrupted);
    assert_eq!(report.completed, 0);
    assert!(sink.is_empty());
    // The in-flight task is dropped, not requeued.
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn test_cancelled_worker_keeps_completed_count() {
    logging::init_test();
    let queue = seeded_queue(5);
    let sink = Arc::new(MemorySink::new());
    let cancel = CancellationToken::new();
    let processor = Arc::new(common::BlockOn("Task 4"));

    let w = worker(1, &queue, sink.clone(), processor, &cancel);
    let progress = w.progress();
    let handle = tokio::spawn(w.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(progress.completed(), 3);

    cancel.cancel();
    let report = handle.await.unwrap();

    assert_eq!(report.exit, WorkerExit::Interrupted);
    assert_eq!(report.completed, 3);
    assert_eq!(report.write_failures, 0);
    assert_eq!(sink.len(), 3);
    assert!(!sink.lines().iter().any(|line| line.ends_with("Task 4")));
    assert_eq!(queue.dequeue(), Some(Task::new("Task 5")));
}

#[tokio::test]
async fn test_cancellation_wins_over_oblivious_processor() {
    let queue = seeded_queue(1);
    let sink = Arc::new(MemorySink::new());
    let cancel = CancellationToken::new();
    let processor = Arc::new(common::Oblivious(Duration::from_secs(30)));

    let handle = tokio::spawn(worker(1, &queue, sink.clone(), processor, &cancel).run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker should stop promptly")
        .unwrap();
    assert_eq!(report.exit, WorkerExit::Interrupted);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_pre_cancelled_worker_dequeues_nothing() {
    let queue = seeded_queue(4);
    let sink = Arc::new(MemorySink::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = worker(1, &queue, sink.clone(), instant(), &cancel).run().await;
    assert_eq!(report.exit, WorkerExit::Interrupted);
    assert_eq!(report.completed, 0);
    assert_eq!(queue.len(), 4);
}

#[tokio::test]
async fn test_write_failures_do_not_stop_the_worker() {
    logging::init_test();
    let queue = seeded_queue(5);
    let sink = Arc::new(common::FailingSink);

    let report = worker(3, &queue, sink, instant(), &CancellationToken::new()).run().await;
    assert_eq!(report.exit, WorkerExit::Drained);
    assert_eq!(report.completed, 5);
    assert_eq!(report.write_failures, 5);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_processing_failure_ends_worker_as_errored() {
    logging::init_test();
    let queue = seeded_queue(5);
    let sink = Arc::new(MemorySink::new());

    let processor = Arc::new(common::FailOn("Task 3"));
    let report = worker(1, &queue, sink.clone(), processor, &CancellationToken::new())
        .run()
        .await;

    assert_eq!(
        report.exit,
        WorkerExit::Errored {
            reason: "cannot process Task 3".to_string()
        }
    );
    assert_eq!(report.completed, 2);
    assert_eq!(sink.len(), 2);
    assert_eq!(queue.dequeue(), Some(Task::new("Task 4")));
}

#[tokio::test]
async fn test_panic_is_contained_at_worker_boundary() {
    logging::init_test();
    let queue = seeded_queue(3);
    let sink = Arc::new(MemorySink::new());

    let processor = Arc::new(common::PanicOn("Task 2"));
    let report = worker(1, &queue, sink.clone(), processor, &CancellationToken::new())
        .run()
        .await;

    match &report.exit {
        WorkerExit::Errored { reason } => assert!(reason.contains("processor exploded on Task 2")),
        other => panic!("expected errored exit, got {other:?}"),
    }
    assert_eq!(report.completed, 1);
    assert_eq!(sink.lines(), vec!["Worker 1 completed task: Task 1"]);
}
