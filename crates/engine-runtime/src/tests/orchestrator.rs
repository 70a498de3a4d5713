use super::fakes::{FakeSink, FakeSource, FakeStore, row, rows, wm};
use crate::orchestrator::Orchestrator;
use engine_core::metrics::Metrics;
use model::transfer::request::{TransferRequest, WriteMode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn request() -> TransferRequest {
    TransferRequest::new("dbo", "Orders", "UpdatedAt")
}

#[tokio::test]
async fn full_run_copies_every_row_and_commits_the_max_cursor() {
    let source = FakeSource::new(rows(7));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let req = request().with_batch_size(3);

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success, "{:?}", summary.error_message);
    assert_eq!(summary.total_rows_to_process, 7);
    assert_eq!(summary.rows_processed, 7);
    assert_eq!(summary.batches_processed, 3);
    assert_eq!(summary.committed_watermark, Some(wm(7)));
    assert_eq!(source.window_calls(), vec![(0, 3), (3, 3), (6, 1)]);
    assert_eq!(sink.written().len(), 7);
    assert_eq!(store.value(&req.key()), Some(wm(7)));
}

#[tokio::test]
async fn rerun_without_new_rows_leaves_everything_alone() {
    let source = FakeSource::new(rows(5));
    let store = FakeStore::default();
    let req = request();

    let mut first_sink = FakeSink::default();
    let first = Orchestrator::new(&source, &mut first_sink, &store)
        .transfer_table(&req)
        .await;
    assert!(first.success);

    let mut sink = FakeSink::default();
    let second = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(second.success);
    assert_eq!(second.total_rows_to_process, 0);
    assert_eq!(second.rows_processed, 0);
    assert_eq!(second.committed_watermark, None);
    assert_eq!(sink.write_calls(), 0);
    assert_eq!(store.write_calls(), 1);
    assert_eq!(store.value(&req.key()), Some(wm(5)));
}

#[tokio::test]
async fn batch_count_is_fixed_by_the_initial_count() {
    let late: Vec<_> = (11..=15).map(|i| row(i as i64, i, "Active")).collect();
    let source = FakeSource::new(rows(10)).with_late_rows(late);
    let store = FakeStore::default();
    let req = request().with_batch_size(4);

    let mut sink = FakeSink::default();
    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert_eq!(summary.batches_processed, 3);
    assert_eq!(summary.rows_processed, 10);
    assert_eq!(source.window_calls(), vec![(0, 4), (4, 4), (8, 2)]);
    assert_eq!(store.value(&req.key()), Some(wm(10)));

    // The rows that arrived mid-run are picked up next time.
    let mut sink = FakeSink::default();
    let next = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;
    assert_eq!(next.rows_processed, 5);
    assert_eq!(store.value(&req.key()), Some(wm(15)));
}

#[tokio::test]
async fn test_mode_never_writes_or_commits() {
    let source = FakeSource::new(rows(7));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let req = request().with_batch_size(3).with_test_mode(true);

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert!(summary.test_mode);
    assert_eq!(summary.rows_processed, 7);
    assert_eq!(summary.committed_watermark, None);
    assert_eq!(sink.write_calls(), 0);
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.value(&req.key()), None);
}

#[tokio::test]
async fn destination_failure_keeps_earlier_batches_and_the_old_watermark() {
    let req = request().with_batch_size(3);
    let source = FakeSource::new(rows(10));
    let mut sink = FakeSink::default().failing_on(3);
    let store = FakeStore::default().with_value(&req.key(), wm(0));

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(!summary.success);
    assert_eq!(summary.rows_processed, 6);
    assert_eq!(summary.batches_processed, 2);
    let message = summary.error_message.unwrap();
    assert!(message.starts_with("Batch 3 failed"), "{message}");
    assert_eq!(sink.written().len(), 6);
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.value(&req.key()), Some(wm(0)));
}

#[tokio::test]
#[traced_test]
async fn twelve_thousand_rows_in_three_batches() {
    let source = FakeSource::new(rows(12_000));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let req = request().with_reporting_frequency(2);
    let metrics = Metrics::new();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .with_metrics(metrics.clone())
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert_eq!(summary.total_rows_to_process, 12_000);
    assert_eq!(summary.rows_processed, 12_000);
    assert_eq!(summary.committed_watermark, Some(wm(12_000)));
    assert_eq!(
        source.window_calls(),
        vec![(0, 5000), (5000, 5000), (10_000, 2000)]
    );
    assert_eq!(metrics.snapshot().rows_copied, 12_000);
    assert_eq!(metrics.snapshot().batches_processed, 3);

    logs_assert(|lines: &[&str]| {
        let progress: Vec<&&str> = lines.iter().filter(|l| l.contains("Progress")).collect();
        match progress.as_slice() {
            [second, last] if second.contains("batch=2") && last.contains("batch=3") => Ok(()),
            other => Err(format!("unexpected progress lines: {other:?}")),
        }
    });
}

#[tokio::test]
async fn filter_excludes_rows_from_copy_and_watermark() {
    let req = request().with_filter("Status='Active'");
    let mut data = rows(5);
    data.extend((6..=10).map(|i| {
        let status = if i % 2 == 0 { "Active" } else { "Inactive" };
        row(i as i64, i, status)
    }));
    data.push(row(11, 20, "Inactive"));

    let source = FakeSource::new(data);
    let mut sink = FakeSink::default();
    let store = FakeStore::default().with_value(&req.key(), wm(5));

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert_eq!(summary.rows_processed, 3);
    assert!(
        sink.written()
            .iter()
            .all(|r| r.get_value("Status").as_string().as_deref() == Some("Active"))
    );
    assert_eq!(store.value(&req.key()), Some(wm(10)));
}

#[tokio::test]
async fn watermark_write_failure_fails_the_run() {
    let source = FakeSource::new(rows(4));
    let mut sink = FakeSink::default();
    let store = FakeStore::default().failing_writes();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&request())
        .await;

    assert!(!summary.success);
    assert_eq!(summary.rows_processed, 4);
    assert_eq!(sink.written().len(), 4);
    assert_eq!(summary.committed_watermark, None);
    assert!(
        summary
            .error_message
            .unwrap()
            .starts_with("Watermark write failed")
    );
}

#[tokio::test]
#[traced_test]
async fn watermark_read_failure_rescans_everything() {
    let req = request();
    let source = FakeSource::new(rows(7));
    let mut sink = FakeSink::default();
    let store = FakeStore::default()
        .with_value(&req.key(), wm(5))
        .failing_reads();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert_eq!(summary.rows_processed, 7);
    assert!(logs_contain("falling back to full scan"));
}

#[tokio::test]
async fn count_failure_is_a_query_error() {
    let source = FakeSource::new(rows(3)).failing_count();
    let mut sink = FakeSink::default();
    let store = FakeStore::default();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&request())
        .await;

    assert!(!summary.success);
    assert_eq!(summary.rows_processed, 0);
    assert!(summary.error_message.unwrap().starts_with("Query error"));
    assert_eq!(sink.write_calls(), 0);
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn text_cursor_is_rejected() {
    let source = FakeSource::new(rows(3));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let req = TransferRequest::new("dbo", "Orders", "Status");

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(!summary.success);
    let message = summary.error_message.unwrap();
    assert!(message.contains("unsupported cursor type"), "{message}");
    assert!(sink.written().is_empty());
    assert_eq!(store.value(&req.key()), None);
}

#[tokio::test]
async fn cancelled_before_start_touches_nothing() {
    let source = FakeSource::new(rows(3));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .with_cancel(cancel)
        .transfer_table(&request())
        .await;

    assert!(!summary.success);
    assert_eq!(summary.error_message.as_deref(), Some("transfer cancelled"));
    assert_eq!(source.count_calls(), 0);
    assert_eq!(sink.write_calls(), 0);
}

#[tokio::test]
async fn cancellation_between_batches_stops_without_commit() {
    let cancel = CancellationToken::new();
    let source = FakeSource::new(rows(10));
    let mut sink = FakeSink::default().cancelling_on(2, cancel.clone());
    let store = FakeStore::default();

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .with_cancel(cancel)
        .transfer_table(&request().with_batch_size(3))
        .await;

    assert!(!summary.success);
    assert_eq!(summary.error_message.as_deref(), Some("transfer cancelled"));
    assert_eq!(summary.rows_processed, 6);
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_a_stuck_batch() {
    let cancel = CancellationToken::new();
    let source = FakeSource::new(rows(3));
    let mut sink = FakeSink::default().hanging_on(1);
    let store = FakeStore::default();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .with_cancel(cancel)
        .transfer_table(&request())
        .await;

    assert!(!summary.success);
    assert_eq!(summary.error_message.as_deref(), Some("transfer cancelled"));
    assert_eq!(summary.rows_processed, 0);
    assert!(sink.written().is_empty());
}

#[tokio::test]
async fn upsert_mode_writes_to_the_target_table() {
    let source = FakeSource::new(rows(4));
    let mut sink = FakeSink::default();
    let store = FakeStore::default();
    let mode = WriteMode::Upsert {
        keys: vec!["Id".into()],
    };
    let req = request()
        .with_batch_size(2)
        .with_write_mode(mode.clone())
        .with_target(Some("public".into()), Some("orders".into()));

    let summary = Orchestrator::new(&source, &mut sink, &store)
        .transfer_table(&req)
        .await;

    assert!(summary.success);
    assert_eq!(
        sink.targets(),
        vec![
            ("public.orders".to_string(), mode.clone()),
            ("public.orders".to_string(), mode)
        ]
    );
}
