use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{WebhookJobRow, WebhookJobStats};
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookJobRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookJobRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookJobRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait WebhookJobStore: Send + Sync {
    /// Fetch a job by its ID. Returns `None` if it doesn't exist.
    async fn get(&self, job_id: uuid::Uuid)
    -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError>;
    /// Insert every row or none of them.
    async fn insert_many(
        &self,
        rows: &[WebhookJobRow],
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError>;
    /// Atomically lease up to `limit` due pending jobs to `worker_id`.
    ///
    /// A job is due when `next_run_at <= now` and it carries no live lease.
    /// Jobs leased by a concurrent caller are skipped, never returned twice.
    async fn claim_due(
        &self,
        now: OffsetDateTime,
        limit: u32,
        worker_id: &str,
        lease_until: OffsetDateTime,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError>;
    /// Persist the job's mutable columns and release its lease.
    async fn update(&self, row: &WebhookJobRow) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// Like `update`, but only while `worker_id` still holds the lease.
    ///
    /// Returns `Conflict` once the lease has passed to another worker.
    async fn release(
        &self,
        row: &WebhookJobRow,
        worker_id: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError>;
    /// Delete a job by its ID. Returns an error if it doesn't exist.
    async fn delete(&self, job_id: uuid::Uuid) -> Result<(), WebhookJobRepositoryError>;
    /// Delete a job only while `worker_id` still holds its lease.
    ///
    /// Returns `Conflict` once the lease has passed to another worker.
    async fn delete_leased(
        &self,
        job_id: uuid::Uuid,
        worker_id: &str,
    ) -> Result<(), WebhookJobRepositoryError>;
    /// Count jobs per status.
    async fn stats(&self) -> Result<WebhookJobStats, WebhookJobRepositoryError>;
}

/// A no-op job store used when persistence is not configured.
pub struct DisabledWebhookJobStore;

#[async_trait]
impl WebhookJobStore for DisabledWebhookJobStore {
    async fn get(
        &self,
        _job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn insert_many(
        &self,
        _rows: &[WebhookJobRow],
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn claim_due(
        &self,
        _now: OffsetDateTime,
        _limit: u32,
        _worker_id: &str,
        _lease_until: OffsetDateTime,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn update(
        &self,
        _row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn release(
        &self,
        _row: &WebhookJobRow,
        _worker_id: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn delete(&self, _job_id: uuid::Uuid) -> Result<(), WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn delete_leased(
        &self,
        _job_id: uuid::Uuid,
        _worker_id: &str,
    ) -> Result<(), WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }

    async fn stats(&self) -> Result<WebhookJobStats, WebhookJobRepositoryError> {
        Err(WebhookJobRepositoryError::StorageUnavailable)
    }
}
