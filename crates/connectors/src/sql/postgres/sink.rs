use crate::{
    sink::RowSink,
    source::RowStream,
    sql::{
        base::error::{ConnectorError, DbError},
        postgres::{encoder::PgCopyValueEncoder, utils::connect_client},
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt, pin_mut};
use model::transfer::request::WriteMode;
use planner::query::{ast::common::TableRef, dialect, generator::QueryGenerator};
use tokio_postgres::Client;
use tracing::debug;
use uuid::Uuid;

const SINK_SESSION_SQL: &str = "SET TIME ZONE 'UTC'";

/// Bulk-loads batches with `COPY FROM STDIN`, one transaction per batch.
pub struct PgSink {
    client: Client,
    dialect: dialect::Postgres,
    encoder: PgCopyValueEncoder,
}

impl PgSink {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        client
            .batch_execute(SINK_SESSION_SQL)
            .await
            .map_err(|e| ConnectorError::Session(e.to_string()))?;
        Ok(PgSink {
            client,
            dialect: dialect::Postgres,
            encoder: PgCopyValueEncoder::new(),
        })
    }
}

#[async_trait]
impl RowSink for PgSink {
    async fn write_rows(
        &mut self,
        target: &TableRef,
        mode: &WriteMode,
        mut rows: RowStream<'_>,
    ) -> Result<u64, DbError> {
        // Column list comes from the first row; an empty batch opens no transaction.
        let first = match rows.next().await {
            Some(row) => row?,
            None => return Ok(0),
        };
        let columns = first.column_names();
        let generator = QueryGenerator::new(&self.dialect);
        let tx = self.client.transaction().await?;

        let staging = match mode {
            WriteMode::Append => None,
            WriteMode::Upsert { keys } => {
                let stage = format!("__transfer_stage_{}", Uuid::new_v4().simple());
                tx.batch_execute(&generator.create_staging_table(&stage, target))
                    .await?;
                Some((stage, keys))
            }
        };

        let copy_target = match &staging {
            Some((stage, _)) => TableRef {
                schema: None,
                name: stage.clone(),
            },
            None => target.clone(),
        };
        let statement = generator.copy_from_stdin(&copy_target, &columns);
        debug!(%statement, "COPY statement");

        let sink = tx.copy_in(&statement).await?;
        pin_mut!(sink);

        let mut pending = Some(first);
        loop {
            let row = match pending.take() {
                Some(row) => row,
                None => match rows.next().await {
                    Some(row) => row?,
                    None => break,
                },
            };
            let line = self
                .encoder
                .encode_line(row.field_values.iter().map(|f| f.value.as_ref()));
            sink.as_mut().send(Bytes::from(line)).await?;
        }
        let copied = sink.as_mut().finish().await?;

        if let Some((stage, keys)) = &staging {
            let merge = generator.merge_from_staging(target, stage, &columns, keys);
            debug!(%merge, "Merging staged rows");
            tx.batch_execute(&merge).await?;
        }

        tx.commit().await?;
        Ok(copied)
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.client.batch_execute("SELECT 1").await?;
        Ok(())
    }
}
