// Use case: retry_failed_job.

use crate::application::context::AppContext;
use crate::domain::entities::webhook_job::{JobRearmError, WebhookJob};
use crate::domain::value_objects::ids::WebhookJobId;
use crate::domain::value_objects::timestamps::Timestamp;
use tracing::info;

/// Puts a permanently failed job back in the queue with a fresh retry budget.
pub struct RetryFailedJobUseCase;

#[derive(Debug, PartialEq, Eq)]
pub enum RetryFailedJobError {
    NotFound,
    NotFailed,
    Storage(String),
}

impl RetryFailedJobUseCase {
    pub async fn execute(
        ctx: &AppContext,
        job_id: WebhookJobId,
        now: Timestamp,
    ) -> Result<WebhookJob, RetryFailedJobError> {
        // Step 1: Load the job.
        let mut job = ctx
            .repos
            .webhook_job
            .get(job_id)
            .await
            .map_err(|e| RetryFailedJobError::Storage(format!("{e:?}")))?
            .ok_or(RetryFailedJobError::NotFound)?;

        // Step 2: Re-arm it.
        job.rearm(now).map_err(|e| match e {
            JobRearmError::NotFailed => RetryFailedJobError::NotFailed,
        })?;

        // Step 3: Persist.
        let stored = ctx
            .repos
            .webhook_job
            .update(&job)
            .await
            .map_err(|e| RetryFailedJobError::Storage(format!("{e:?}")))?;

        info!(job_id = %stored.id, "failed webhook job re-armed");
        Ok(stored)
    }
}
