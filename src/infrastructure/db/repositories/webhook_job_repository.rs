use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::value_objects::ids::WebhookJobId;
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::{WebhookJobRow, WebhookJobStats};
use crate::infrastructure::db::stores::webhook_job_store::{
    WebhookJobRepositoryError, WebhookJobStore,
};
use std::sync::Arc;

pub struct WebhookJobRepository {
    store: Arc<dyn WebhookJobStore>,
}

impl WebhookJobRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn WebhookJobStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        job_id: WebhookJobId,
    ) -> Result<Option<WebhookJob>, WebhookJobRepositoryError> {
        let row = self.store.get(job_id.0).await?;
        Ok(row.map(WebhookJobRow::into_job))
    }

    /// Enqueue all jobs atomically.
    pub async fn insert_many(
        &self,
        jobs: &[WebhookJob],
    ) -> Result<Vec<WebhookJob>, WebhookJobRepositoryError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<WebhookJobRow> = jobs.iter().map(WebhookJobRow::from_job).collect();
        let stored = self.store.insert_many(&rows).await?;
        Ok(stored.into_iter().map(WebhookJobRow::into_job).collect())
    }

    /// Lease up to `limit` due jobs to `worker_id` until `lease_until`.
    pub async fn claim_due(
        &self,
        now: Timestamp,
        limit: u32,
        worker_id: &str,
        lease_until: Timestamp,
    ) -> Result<Vec<WebhookJob>, WebhookJobRepositoryError> {
        let rows = self
            .store
            .claim_due(now.as_inner(), limit, worker_id, lease_until.as_inner())
            .await?;
        Ok(rows.into_iter().map(WebhookJobRow::into_job).collect())
    }

    /// Persist the job and release whatever lease it held.
    pub async fn update(&self, job: &WebhookJob) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = WebhookJobRow::from_job(job);
        let stored = self.store.update(&row).await?;
        Ok(stored.into_job())
    }

    /// Persist the job and release the lease `worker_id` holds on it.
    pub async fn release(
        &self,
        job: &WebhookJob,
        worker_id: &str,
    ) -> Result<WebhookJob, WebhookJobRepositoryError> {
        let row = WebhookJobRow::from_job(job);
        let stored = self.store.release(&row, worker_id).await?;
        Ok(stored.into_job())
    }

    pub async fn delete(&self, job_id: WebhookJobId) -> Result<(), WebhookJobRepositoryError> {
        self.store.delete(job_id.0).await
    }

    /// Delete a job still leased to `worker_id`.
    pub async fn delete_leased(
        &self,
        job_id: WebhookJobId,
        worker_id: &str,
    ) -> Result<(), WebhookJobRepositoryError> {
        self.store.delete_leased(job_id.0, worker_id).await
    }

    pub async fn stats(&self) -> Result<WebhookJobStats, WebhookJobRepositoryError> {
        self.store.stats().await
    }
}
