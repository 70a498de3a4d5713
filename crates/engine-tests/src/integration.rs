#[cfg(test)]
mod tests {
    use crate::{
        dest_count, insert_orders, minute, orders_request, reset_schema, run_table, watermark_store,
    };
    use engine_core::watermark::{WatermarkStore, sled_store::SledWatermarkStore};
    use model::transfer::{request::WriteMode, watermark::Watermark};
    use tracing_test::traced_test;

    // Scenario: no prior watermark, 25 source rows, batch size 10.
    // Expected Outcome:
    // - Three batches copy all 25 rows and the watermark lands on row 25.
    // - Rows inserted afterwards are picked up by the next run only.
    // - A run with nothing new copies nothing and keeps the watermark.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn full_then_incremental_runs() {
        let schema = "it_incremental";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 25).await;
        let store = watermark_store(schema).await;
        let request = orders_request(schema).with_batch_size(10);

        let first = run_table(&request, &store).await;
        assert!(first.success, "{:?}", first.error_message);
        assert_eq!(first.total_rows_to_process, 25);
        assert_eq!(first.batches_processed, 3);
        assert_eq!(dest_count(&client, schema).await, 25);
        assert_eq!(
            store.read_watermark(&request.key()).await.unwrap(),
            Some(Watermark::new(minute(25)))
        );

        insert_orders(&client, schema, 26, 30).await;
        let second = run_table(&request, &store).await;
        assert!(second.success);
        assert_eq!(second.rows_processed, 5);
        assert_eq!(dest_count(&client, schema).await, 30);

        let third = run_table(&request, &store).await;
        assert!(third.success);
        assert_eq!(third.rows_processed, 0);
        assert_eq!(
            store.read_watermark(&request.key()).await.unwrap(),
            Some(Watermark::new(minute(30)))
        );
    }

    // Scenario: upsert mode, then the watermark is lost and the run repeats.
    // Expected Outcome: the destination still holds one row per id.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn upsert_rerun_is_idempotent() {
        let schema = "it_upsert";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 12).await;
        let store = watermark_store(schema).await;
        let request = orders_request(schema)
            .with_batch_size(5)
            .with_write_mode(WriteMode::Upsert {
                keys: vec!["id".into()],
            });

        assert!(run_table(&request, &store).await.success);

        client
            .batch_execute(&format!(
                "DELETE FROM {schema}.transfer_watermarks; \
                 UPDATE {schema}.orders SET amount = 0 WHERE id = 3;"
            ))
            .await
            .unwrap();

        let rerun = run_table(&request, &store).await;
        assert!(rerun.success, "{:?}", rerun.error_message);
        assert_eq!(rerun.rows_processed, 12);
        assert_eq!(dest_count(&client, schema).await, 12);

        let amount: String = client
            .query_one(
                &format!("SELECT amount::text FROM {schema}_dest.orders WHERE id = 3"),
                &[],
            )
            .await
            .unwrap()
            .get(0);
        assert_eq!(amount, "0.00");
    }

    // Scenario: filter on Status with a prior watermark.
    // Expected Outcome: only active rows past the watermark are copied.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn filter_and_prior_watermark() {
        let schema = "it_filter";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 20).await;
        let store = watermark_store(schema).await;
        let request = orders_request(schema).with_filter("status = 'Active'");
        store
            .set_watermark(&request.key(), Watermark::new(minute(10)))
            .await
            .unwrap();

        let summary = run_table(&request, &store).await;
        assert!(summary.success);
        // Even ids 12..=20.
        assert_eq!(summary.rows_processed, 5);
        assert_eq!(dest_count(&client, schema).await, 5);
        assert_eq!(summary.committed_watermark, Some(Watermark::new(minute(20))));
    }

    // Scenario: test mode.
    // Expected Outcome: rows are counted, nothing is written or committed.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn test_mode_writes_nothing() {
        let schema = "it_test_mode";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 8).await;
        let store = watermark_store(schema).await;
        let request = orders_request(schema).with_test_mode(true);

        let summary = run_table(&request, &store).await;
        assert!(summary.success);
        assert_eq!(summary.rows_processed, 8);
        assert_eq!(dest_count(&client, schema).await, 0);
        assert_eq!(store.read_watermark(&request.key()).await.unwrap(), None);
    }

    // Scenario: NULL cursor values and a local sled watermark store.
    // Expected Outcome: NULL rows are copied but do not move the watermark.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn null_cursors_with_sled_store() {
        let schema = "it_sled";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 4).await;
        client
            .batch_execute(&format!(
                "UPDATE {schema}.orders SET updated_at = NULL WHERE id = 4;"
            ))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        let request = orders_request(schema);

        let summary = run_table(&request, &store).await;
        assert!(summary.success);
        // The NULL row never satisfies `updated_at > watermark`, but the
        // first run has no watermark and copies it.
        assert_eq!(summary.rows_processed, 4);
        assert_eq!(
            store.read_watermark(&request.key()).await.unwrap(),
            Some(Watermark::new(minute(3)))
        );
    }

    // Scenario: the destination-backed store on a fresh tracking table.
    // Expected Outcome:
    // - The first write inserts the record.
    // - An older value never replaces a newer one.
    // - A newer value advances it and `list` returns the single record.
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn pg_store_inserts_then_only_advances() {
        let schema = "it_pg_store";
        reset_schema(schema).await;
        let store = watermark_store(schema).await;
        let key = orders_request(schema).key();

        store
            .set_watermark(&key, Watermark::new(minute(10)))
            .await
            .unwrap();
        store
            .set_watermark(&key, Watermark::new(minute(5)))
            .await
            .unwrap();
        assert_eq!(
            store.read_watermark(&key).await.unwrap(),
            Some(Watermark::new(minute(10)))
        );

        store
            .set_watermark(&key, Watermark::new(minute(12)))
            .await
            .unwrap();
        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].last_value, Watermark::new(minute(12)));
    }

    // Scenario: a filter naming a column the source does not have.
    // Expected Outcome: the run fails and the summary carries the server's
    // own message rather than a generic "db error".
    #[traced_test]
    #[tokio::test]
    #[ignore = "needs a running Postgres at TEST_PG_URL"]
    async fn bad_filter_reports_the_server_message() {
        let schema = "it_bad_filter";
        let client = reset_schema(schema).await;
        insert_orders(&client, schema, 1, 3).await;
        let store = watermark_store(schema).await;
        let request = orders_request(schema).with_filter("no_such_column = 1");

        let summary = run_table(&request, &store).await;
        assert!(!summary.success);
        let message = summary.error_message.unwrap_or_default();
        assert!(message.starts_with("Query error"), "{message}");
        assert!(message.contains("no_such_column"), "{message}");
        assert!(message.contains("42703"), "{message}");
        assert_eq!(dest_count(&client, schema).await, 0);
    }
}
