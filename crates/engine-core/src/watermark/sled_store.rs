use crate::{error::WatermarkError, watermark::WatermarkStore};
use async_trait::async_trait;
use chrono::Utc;
use model::transfer::{
    key::TableKey,
    watermark::{Watermark, WatermarkRecord},
};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;
use tracing::info;

const KEY_PREFIX: &[u8] = b"wm:";

/// Watermarks kept in a local embedded database.
pub struct SledWatermarkStore {
    db: sled::Db,
}

impl SledWatermarkStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WatermarkError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Prefix plus the bincode-encoded key, so names may contain any character.
    fn record_key(key: &TableKey) -> Result<Vec<u8>, WatermarkError> {
        let mut bytes = KEY_PREFIX.to_vec();
        bytes.extend(bincode::serialize(key)?);
        Ok(bytes)
    }
}

#[async_trait]
impl WatermarkStore for SledWatermarkStore {
    async fn ensure_tracking_table(&self) -> Result<(), WatermarkError> {
        Ok(())
    }

    async fn read_watermark(&self, key: &TableKey) -> Result<Option<Watermark>, WatermarkError> {
        match self.db.get(Self::record_key(key)?)? {
            Some(bytes) => {
                let record: WatermarkRecord = bincode::deserialize(&bytes)?;
                Ok(Some(record.last_value))
            }
            None => Ok(None),
        }
    }

    async fn set_watermark(&self, key: &TableKey, value: Watermark) -> Result<(), WatermarkError> {
        let record_key = Self::record_key(key)?;

        // Check-then-set inside one transaction keeps the value monotonic.
        let result = self
            .db
            .transaction::<_, _, bincode::Error>(|tx_db| {
                let last_value = match tx_db.get(&record_key)? {
                    Some(bytes) => {
                        let existing: WatermarkRecord = bincode::deserialize(&bytes)
                            .map_err(ConflictableTransactionError::Abort)?;
                        existing.last_value.max(value)
                    }
                    None => value,
                };

                let record = WatermarkRecord {
                    key: key.clone(),
                    last_value,
                    last_updated: Utc::now(),
                };
                let bytes =
                    bincode::serialize(&record).map_err(ConflictableTransactionError::Abort)?;
                tx_db.insert(record_key.as_slice(), bytes)?;
                Ok(())
            });

        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e.into()),
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }

        self.db.flush_async().await?;
        info!(table = %key, watermark = %value, "Watermark committed");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WatermarkRecord>, WatermarkError> {
        let mut records = Vec::new();
        for item in self.db.scan_prefix(KEY_PREFIX) {
            let (_key, value) = item?;
            records.push(bincode::deserialize::<WatermarkRecord>(&value)?);
        }
        records.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn key() -> TableKey {
        TableKey::new("dbo", "Orders", "UpdatedAt")
    }

    fn wm(day: u32) -> Watermark {
        Watermark::new(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn missing_key_has_no_watermark() {
        let dir = tempdir().unwrap();
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        store.ensure_tracking_table().await.unwrap();
        assert_eq!(store.get_watermark(&key()).await, None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        store.set_watermark(&key(), wm(5)).await.unwrap();
        assert_eq!(store.get_watermark(&key()).await, Some(wm(5)));
    }

    #[tokio::test]
    async fn never_moves_backwards() {
        let dir = tempdir().unwrap();
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        store.set_watermark(&key(), wm(10)).await.unwrap();
        store.set_watermark(&key(), wm(3)).await.unwrap();
        assert_eq!(store.get_watermark(&key()).await, Some(wm(10)));

        store.set_watermark(&key(), wm(12)).await.unwrap();
        assert_eq!(store.get_watermark(&key()).await, Some(wm(12)));
    }

    #[tokio::test]
    async fn keys_are_independent_and_listed() {
        let dir = tempdir().unwrap();
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        let other = TableKey::new("dbo", "Orders", "CreatedAt");
        store.set_watermark(&key(), wm(1)).await.unwrap();
        store.set_watermark(&other, wm(2)).await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, other);
        assert_eq!(records[0].last_value, wm(2));
        assert_eq!(records[1].key, key());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = SledWatermarkStore::open(dir.path()).unwrap();
            store.set_watermark(&key(), wm(7)).await.unwrap();
        }
        let store = SledWatermarkStore::open(dir.path()).unwrap();
        assert_eq!(store.get_watermark(&key()).await, Some(wm(7)));
    }
}
