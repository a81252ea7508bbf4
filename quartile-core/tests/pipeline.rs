mod support;

use std::sync::Arc;
use std::time::Duration;

use quartile_core::dispatcher::Dispatcher;
use quartile_core::error::PipelineError;
use quartile_core::pipeline::{run_consumer, run_pool, run_producer};
use quartile_core::queue::{MemoryQueue, QueueTransport};
use quartile_core::source::{PoolSource, QueueSource, WorkSource};
use quartile_core::types::{Disposition, Identifier};
use support::{FakeEngine, PageScript, QUARTILE_CELLS, output_files, read_json, test_config};
use tokio_util::sync::CancellationToken;

fn write_input(root: &tempfile::TempDir, lines: &str) -> std::path::PathBuf {
    let path = root.path().join("journals.txt");
    std::fs::write(&path, lines).unwrap();
    path
}

#[tokio::test]
async fn pool_writes_one_file_per_distinct_identifier() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let input = write_input(&root, "1234-5678\n\n  \n9999-0000\n1234-5678\n");
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let stats = engine.stats.clone();

    let report = run_pool(
        support::worker(engine, &config),
        &input,
        8,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.acknowledged, 3);
    assert_eq!(report.abandoned, 0);
    assert_eq!(stats.started(), 3);
    assert_eq!(stats.terminated(), 3);

    let files = output_files(&config.output.dir);
    assert_eq!(files.len(), 2);
    assert_eq!(
        read_json(&config.output.dir.join("output_9999-0000.json")),
        serde_json::json!({ "9999-0000": { "2020": "Q1", "2021": "Q2" } })
    );
}

#[tokio::test]
async fn pool_with_missing_input_does_nothing() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let stats = engine.stats.clone();

    let report = run_pool(
        support::worker(engine, &config),
        &root.path().join("missing.txt"),
        4,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.settled(), 0);
    assert_eq!(stats.started(), 0);
}

#[tokio::test]
async fn pool_abandons_items_when_browser_is_missing() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(&root);
    config.browser.binary_path = Some(root.path().join("no-such-browser"));
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));

    let source = Arc::new(PoolSource::new(
        ["a", "b", "c"].into_iter().filter_map(Identifier::parse),
    ));
    let report = Dispatcher::new(
        Arc::new(support::worker(engine, &config)),
        2,
        CancellationToken::new(),
    )
    .run(Arc::clone(&source))
    .await
    .unwrap();

    assert_eq!(report.abandoned, 3);
    assert_eq!(source.remaining().await, 0);
    assert!(output_files(&config.output.dir).is_empty());
}

#[tokio::test]
async fn zero_workers_is_clamped_to_one_slot() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let dispatcher = Dispatcher::new(
        Arc::new(support::worker(engine, &config)),
        0,
        CancellationToken::new(),
    );
    assert_eq!(dispatcher.slots(), 1);

    let source = Arc::new(PoolSource::new(Identifier::parse("a")));
    let report = dispatcher.run(source).await.unwrap();
    assert_eq!(report.acknowledged, 1);
}

#[tokio::test]
async fn producer_publishes_in_input_order() {
    let root = tempfile::tempdir().unwrap();
    let input = write_input(&root, "1234-5678\n\n  \n9999-0000\n");
    let queue = Arc::new(MemoryQueue::new("journal_queue"));

    let published = run_producer(Arc::clone(&queue), &input).await.unwrap();

    assert_eq!(published, 2);
    assert_eq!(queue.ready(), vec!["1234-5678", "9999-0000"]);
}

#[tokio::test]
async fn producer_fails_on_missing_input() {
    let root = tempfile::tempdir().unwrap();
    let queue = MemoryQueue::new("journal_queue");

    let err = run_producer(queue, &root.path().join("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }));
}

#[tokio::test]
async fn producer_stops_on_transport_failure() {
    let root = tempfile::tempdir().unwrap();
    let input = write_input(&root, "a\nb\n");
    let queue = MemoryQueue::new("journal_queue");
    queue.disconnect();

    let err = run_producer(queue, &input).await.unwrap_err();
    assert!(matches!(err, PipelineError::Transport(_)));
}

#[tokio::test]
async fn consumer_exits_immediately_on_empty_queue() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let engine = FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS));
    let stats = engine.stats.clone();

    let report = run_consumer(
        support::worker(engine, &config),
        Arc::new(MemoryQueue::new("journal_queue")),
        Duration::from_millis(10),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.settled(), 0);
    assert_eq!(stats.started(), 0);
}

#[tokio::test]
async fn consumer_acknowledges_each_delivery_once_until_shutdown() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let engine = FakeEngine::new(PageScript {
        control_present: false,
        ..PageScript::default()
    });
    let queue = Arc::new(MemoryQueue::seeded("journal_queue", ["a", "b"]));
    let shutdown = CancellationToken::new();

    let consumer = tokio::spawn(run_consumer(
        support::worker(engine, &config),
        Arc::clone(&queue),
        Duration::from_millis(10),
        shutdown.clone(),
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        while queue.acked().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("deliveries were not acknowledged");

    // Still waiting for more work after the queue drains.
    assert!(!consumer.is_finished());
    shutdown.cancel();
    let report = consumer.await.unwrap().unwrap();

    assert_eq!(report.acknowledged, 2);
    assert_eq!(queue.acked(), vec!["a", "b"]);
    assert_eq!(queue.requeued(), 0);
    assert_eq!(queue.inflight_len(), 0);
    assert_eq!(
        read_json(&config.output.dir.join("output_a.json")),
        serde_json::json!({ "a": {} })
    );
}

#[tokio::test]
async fn consumer_recovers_unsettled_deliveries_first() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let queue = Arc::new(MemoryQueue::seeded("journal_queue", ["left-over"]));
    // A previous run took the message and died before settling it.
    queue.receive().await.unwrap().unwrap();
    assert_eq!(queue.declare().await.unwrap(), 0);

    let shutdown = CancellationToken::new();
    let consumer = tokio::spawn(run_consumer(
        support::worker(FakeEngine::new(PageScript::with_cells(QUARTILE_CELLS)), &config),
        Arc::clone(&queue),
        Duration::from_millis(10),
        shutdown.clone(),
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        while queue.acked().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("recovered delivery was not processed");
    shutdown.cancel();
    consumer.await.unwrap().unwrap();

    assert_eq!(queue.acked(), vec!["left-over"]);
}

#[tokio::test]
async fn misconfigured_delivery_is_requeued() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(&root);
    config.browser.binary_path = Some(root.path().join("no-such-browser"));
    let worker = support::worker(FakeEngine::new(PageScript::default()), &config);

    let queue = Arc::new(MemoryQueue::seeded("journal_queue", ["1234-5678"]));
    let source = QueueSource::new(Arc::clone(&queue), Duration::from_millis(10));
    let shutdown = CancellationToken::new();

    let delivery = source.next(&shutdown).await.unwrap().unwrap();
    let outcome = worker.fetch(&delivery.item).await;
    let disposition = source.complete(delivery, &outcome).await.unwrap();

    assert_eq!(disposition, Disposition::Requeue);
    assert_eq!(queue.requeued(), 1);
    assert!(queue.acked().is_empty());
    assert_eq!(queue.ready(), vec!["1234-5678"]);
}

#[tokio::test]
async fn blank_messages_are_discarded() {
    let queue = Arc::new(MemoryQueue::seeded("journal_queue", ["   ", "x"]));
    let source = QueueSource::new(Arc::clone(&queue), Duration::from_millis(10));

    let delivery = source
        .next(&CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(delivery.item.identifier.as_str(), "x");
    assert_eq!(queue.acked(), vec!["   "]);
}

#[tokio::test]
async fn idle_queue_source_returns_on_shutdown() {
    let queue = Arc::new(MemoryQueue::new("journal_queue"));
    let source = QueueSource::new(queue, Duration::from_secs(60));
    let shutdown = CancellationToken::new();

    let waiting = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { source.next(&shutdown).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.cancel();

    let next = tokio::time::timeout(Duration::from_secs(1), waiting)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(next.is_none());
}

#[tokio::test]
async fn transport_failure_stops_the_dispatcher() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let queue = Arc::new(MemoryQueue::seeded("journal_queue", ["a"]));
    queue.disconnect();
    let source = Arc::new(QueueSource::new(queue, Duration::from_millis(10)));

    let err = Dispatcher::new(
        Arc::new(support::worker(FakeEngine::new(PageScript::default()), &config)),
        3,
        CancellationToken::new(),
    )
    .run(source)
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Transport(_)));
}
