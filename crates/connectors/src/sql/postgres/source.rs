use crate::{
    source::{RowSource, RowStream},
    sql::{
        base::{
            error::{ConnectorError, DbError},
            row::DbRow,
        },
        postgres::{params::PgParamStore, utils::connect_client},
    },
};
use async_trait::async_trait;
use futures_util::StreamExt;
use model::transfer::{key::TableKey, watermark::Watermark};
use planner::query::{
    dialect,
    generator::{QueryGenerator, WindowSpec},
};
use tokio_postgres::Client;
use tracing::debug;

/// Dirty reads keep extraction from blocking writers; timestamps are read in UTC.
const SOURCE_SESSION_SQL: &str = "SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL READ UNCOMMITTED; SET TIME ZONE 'UTC'";

pub struct PgSource {
    client: Client,
    dialect: dialect::Postgres,
}

impl PgSource {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        client
            .batch_execute(SOURCE_SESSION_SQL)
            .await
            .map_err(|e| ConnectorError::Session(e.to_string()))?;
        Ok(PgSource {
            client,
            dialect: dialect::Postgres,
        })
    }
}

#[async_trait]
impl RowSource for PgSource {
    async fn count_pending(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> Result<u64, DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        let (sql, params) = generator.pending_count(key, watermark, filter);
        debug!(%sql, "Counting pending rows");

        let bindings = PgParamStore::from_values(params);
        let row = self.client.query_one(&sql, &bindings.as_refs()).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_window<'a>(&'a self, spec: &WindowSpec<'_>) -> Result<RowStream<'a>, DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        let (sql, params) = generator.batch_window(spec);
        debug!(%sql, offset = spec.offset, limit = spec.limit, "Fetching window");

        let bindings = PgParamStore::from_values(params);
        let rows = self.client.query_raw(&sql, bindings.as_refs()).await?;
        let table = spec.key.table_name.clone();

        Ok(rows
            .map(move |row| DbRow::PostgresRow(&row?).to_row_data(&table))
            .boxed())
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.client.batch_execute("SELECT 1").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
