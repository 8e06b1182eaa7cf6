use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::DeliveryRecordRow;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRecordRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for DeliveryRecordRepositoryError {
    fn from(_: DatabaseError) -> Self {
        DeliveryRecordRepositoryError::StorageUnavailable
    }
}

/// Append-only log of delivery attempts. Rows are never updated.
#[async_trait]
pub trait DeliveryRecordStore: Send + Sync {
    async fn insert(
        &self,
        row: &DeliveryRecordRow,
    ) -> Result<DeliveryRecordRow, DeliveryRecordRepositoryError>;
    /// Most recent attempts for a subscription, newest first.
    async fn list_by_subscription(
        &self,
        subscription_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError>;
    /// Every attempt made for a job, in attempt order.
    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError>;
}

/// A no-op delivery log used when persistence is not configured.
pub struct DisabledDeliveryRecordStore;

#[async_trait]
impl DeliveryRecordStore for DisabledDeliveryRecordStore {
    async fn insert(
        &self,
        _row: &DeliveryRecordRow,
    ) -> Result<DeliveryRecordRow, DeliveryRecordRepositoryError> {
        Err(DeliveryRecordRepositoryError::StorageUnavailable)
    }

    async fn list_by_subscription(
        &self,
        _subscription_id: uuid::Uuid,
        _limit: u32,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        Err(DeliveryRecordRepositoryError::StorageUnavailable)
    }

    async fn list_by_job(
        &self,
        _job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        Err(DeliveryRecordRepositoryError::StorageUnavailable)
    }
}
