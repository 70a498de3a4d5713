use crate::{
    source::{RowSource, RowStream},
    sql::{
        base::{
            error::{ConnectorError, DbError},
            row::DbRow,
        },
        mysql::params::MySqlParamStore,
    },
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use model::transfer::{key::TableKey, watermark::Watermark};
use mysql_async::{Conn, Opts, Row, prelude::Queryable};
use planner::query::{
    dialect,
    generator::{QueryGenerator, WindowSpec},
};
use tokio::sync::Mutex;
use tracing::debug;

const SESSION_ISOLATION_SQL: &str = "SET SESSION TRANSACTION ISOLATION LEVEL READ UNCOMMITTED";
const SESSION_TIME_ZONE_SQL: &str = "SET time_zone = '+00:00'";

/// MySQL source. The driver needs exclusive access per statement, so the
/// connection sits behind a mutex and each window is buffered before it is
/// handed out as a stream.
pub struct MySqlSource {
    conn: Mutex<Conn>,
    dialect: dialect::MySql,
}

impl MySqlSource {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
        let mut conn = Conn::new(opts).await?;
        for statement in [SESSION_ISOLATION_SQL, SESSION_TIME_ZONE_SQL] {
            conn.query_drop(statement)
                .await
                .map_err(|e| ConnectorError::Session(e.to_string()))?;
        }
        Ok(MySqlSource {
            conn: Mutex::new(conn),
            dialect: dialect::MySql,
        })
    }
}

#[async_trait]
impl RowSource for MySqlSource {
    async fn count_pending(
        &self,
        key: &TableKey,
        watermark: Option<&Watermark>,
        filter: Option<&str>,
    ) -> Result<u64, DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        let (sql, params) = generator.pending_count(key, watermark, filter);
        debug!(%sql, "Counting pending rows");

        let bindings = MySqlParamStore::from_values(&params);
        let mut conn = self.conn.lock().await;
        let count: Option<u64> = conn.exec_first(sql, bindings.params()).await?;
        Ok(count.unwrap_or(0))
    }

    async fn fetch_window<'a>(&'a self, spec: &WindowSpec<'_>) -> Result<RowStream<'a>, DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        let (sql, params) = generator.batch_window(spec);
        debug!(%sql, offset = spec.offset, limit = spec.limit, "Fetching window");

        let bindings = MySqlParamStore::from_values(&params);
        let rows: Vec<Row> = {
            let mut conn = self.conn.lock().await;
            conn.exec(sql, bindings.params()).await?
        };

        let table = &spec.key.table_name;
        let decoded = rows
            .iter()
            .map(|row| DbRow::MySqlRow(row).to_row_data(table))
            .collect::<Vec<_>>();

        Ok(stream::iter(decoded).boxed())
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.conn.lock().await;
        conn.query_drop("SELECT 1").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}
