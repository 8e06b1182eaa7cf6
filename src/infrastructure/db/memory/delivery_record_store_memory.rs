use crate::infrastructure::db::dto::DeliveryRecordRow;
use crate::infrastructure::db::stores::delivery_record_store::{
    DeliveryRecordRepositoryError, DeliveryRecordStore,
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct InMemoryDeliveryRecordStore {
    rows: RwLock<Vec<DeliveryRecordRow>>,
}

impl InMemoryDeliveryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeliveryRecordStore for InMemoryDeliveryRecordStore {
    async fn insert(
        &self,
        row: &DeliveryRecordRow,
    ) -> Result<DeliveryRecordRow, DeliveryRecordRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| DeliveryRecordRepositoryError::StorageUnavailable)?;
        if rows.iter().any(|existing| existing.id == row.id) {
            return Err(DeliveryRecordRepositoryError::Conflict);
        }
        rows.push(row.clone());
        Ok(row.clone())
    }

    async fn list_by_subscription(
        &self,
        subscription_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| DeliveryRecordRepositoryError::StorageUnavailable)?;
        let mut matching: Vec<(usize, &DeliveryRecordRow)> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.subscription_id == subscription_id)
            .collect();
        // Insertion order breaks ties between records written in the same instant.
        matching.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| DeliveryRecordRepositoryError::StorageUnavailable)?;
        let mut matching: Vec<DeliveryRecordRow> = rows
            .iter()
            .filter(|row| row.job_id == job_id)
            .cloned()
            .collect();
        matching.sort_by_key(|row| (row.attempt_index, row.created_at));
        Ok(matching)
    }
}
