use crate::{error::WatermarkError, watermark::WatermarkStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use connectors::sql::postgres::{params::PgParamStore, utils::connect_client};
use model::transfer::{
    key::TableKey,
    watermark::{Watermark, WatermarkRecord},
};
use planner::query::{
    ast::common::TableRef,
    dialect,
    generator::{
        COL_CURSOR_COLUMN, COL_LAST_UPDATED, COL_LAST_VALUE, COL_SCHEMA_NAME, COL_TABLE_NAME,
        QueryGenerator,
    },
};
use tokio_postgres::{Client, Row};
use tracing::{debug, info};

pub const DEFAULT_STATE_SCHEMA: &str = "public";
pub const DEFAULT_STATE_TABLE: &str = "transfer_watermarks";

/// Watermarks kept in a tracking table on the destination database.
pub struct PgWatermarkStore {
    client: Client,
    table: TableRef,
    dialect: dialect::Postgres,
}

impl PgWatermarkStore {
    pub async fn connect(url: &str, schema: &str, table: &str) -> Result<Self, WatermarkError> {
        let client = connect_client(url).await?;
        Ok(Self::new(client, schema, table))
    }

    pub fn new(client: Client, schema: &str, table: &str) -> Self {
        PgWatermarkStore {
            client,
            table: TableRef::new(schema, table),
            dialect: dialect::Postgres,
        }
    }

    fn record_from_row(row: &Row) -> Result<WatermarkRecord, WatermarkError> {
        let key = TableKey::new(
            row.try_get::<_, String>(COL_SCHEMA_NAME)?,
            row.try_get::<_, String>(COL_TABLE_NAME)?,
            row.try_get::<_, String>(COL_CURSOR_COLUMN)?,
        );
        Ok(WatermarkRecord {
            key,
            last_value: Watermark::new(row.try_get::<_, DateTime<Utc>>(COL_LAST_VALUE)?),
            last_updated: row.try_get::<_, DateTime<Utc>>(COL_LAST_UPDATED)?,
        })
    }
}

#[async_trait]
impl WatermarkStore for PgWatermarkStore {
    async fn ensure_tracking_table(&self) -> Result<(), WatermarkError> {
        let sql = QueryGenerator::new(&self.dialect).create_watermark_table(&self.table);
        debug!(%sql, "Ensuring watermark table");
        self.client.batch_execute(&sql).await?;
        Ok(())
    }

    async fn read_watermark(&self, key: &TableKey) -> Result<Option<Watermark>, WatermarkError> {
        let (sql, params) = QueryGenerator::new(&self.dialect).select_watermark(&self.table, key);
        let bindings = PgParamStore::from_values(params);
        let row = self.client.query_opt(&sql, &bindings.as_refs()).await?;
        match row {
            Some(row) => Ok(Some(Watermark::new(row.try_get::<_, DateTime<Utc>>(0)?))),
            None => Ok(None),
        }
    }

    async fn set_watermark(&self, key: &TableKey, value: Watermark) -> Result<(), WatermarkError> {
        let (sql, params) =
            QueryGenerator::new(&self.dialect).upsert_watermark(&self.table, key, &value);
        let bindings = PgParamStore::from_values(params);
        self.client.execute(&sql, &bindings.as_refs()).await?;
        info!(table = %key, watermark = %value, "Watermark committed");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WatermarkRecord>, WatermarkError> {
        let sql = QueryGenerator::new(&self.dialect).list_watermarks(&self.table);
        let rows = self.client.query(&sql, &[]).await?;
        rows.iter().map(Self::record_from_row).collect()
    }
}
