use crate::domain::entities::delivery_record::DeliveryRecord;
use crate::domain::value_objects::ids::{SubscriptionId, WebhookJobId};
use crate::infrastructure::db::dto::DeliveryRecordRow;
use crate::infrastructure::db::stores::delivery_record_store::{
    DeliveryRecordRepositoryError, DeliveryRecordStore,
};
use std::sync::Arc;

pub struct DeliveryRecordRepository {
    store: Arc<dyn DeliveryRecordStore>,
}

impl DeliveryRecordRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn DeliveryRecordStore>) -> Self {
        Self { store }
    }

    /// Append one attempt to the log.
    pub async fn record(
        &self,
        record: &DeliveryRecord,
    ) -> Result<DeliveryRecord, DeliveryRecordRepositoryError> {
        let row = DeliveryRecordRow::from_record(record);
        let stored = self.store.insert(&row).await?;
        Ok(stored.into_record())
    }

    pub async fn list_by_subscription(
        &self,
        subscription_id: SubscriptionId,
        limit: u32,
    ) -> Result<Vec<DeliveryRecord>, DeliveryRecordRepositoryError> {
        let rows = self
            .store
            .list_by_subscription(subscription_id.0, limit)
            .await?;
        Ok(rows.into_iter().map(DeliveryRecordRow::into_record).collect())
    }

    pub async fn list_by_job(
        &self,
        job_id: WebhookJobId,
    ) -> Result<Vec<DeliveryRecord>, DeliveryRecordRepositoryError> {
        let rows = self.store.list_by_job(job_id.0).await?;
        Ok(rows.into_iter().map(DeliveryRecordRow::into_record).collect())
    }
}
