use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::ids::{SubscriptionId, WebhookJobId};
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookJobRow {
    pub id: uuid::Uuid,
    pub subscription_id: uuid::Uuid,
    pub event_name: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempt_count: i32,
    pub prior_attempts: i32,
    pub next_run_at: OffsetDateTime,
    pub last_error: Option<String>,
    pub locked_by: Option<String>,
    pub locked_until: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct WebhookJobStats {
    pub pending: i64,
    pub failed: i64,
}

impl WebhookJobRow {
    /// Build a row from the entity. Lease columns are always cleared.
    pub fn from_job(job: &WebhookJob) -> Self {
        Self {
            id: job.id.0,
            subscription_id: job.subscription_id.0,
            event_name: job.event_name.clone(),
            payload: job.payload.clone(),
            status: job.status.as_str().to_string(),
            attempt_count: job.attempt_count.min(i32::MAX as u32) as i32,
            prior_attempts: job.prior_attempts.min(i32::MAX as u32) as i32,
            next_run_at: job.next_run_at.as_inner(),
            last_error: job.last_error.clone(),
            locked_by: None,
            locked_until: None,
            created_at: job.created_at.as_inner(),
            updated_at: job.updated_at.as_inner(),
        }
    }

    pub fn into_job(self) -> WebhookJob {
        WebhookJob {
            id: WebhookJobId(self.id),
            subscription_id: SubscriptionId(self.subscription_id),
            event_name: self.event_name,
            payload: self.payload,
            // Unknown states are never delivered.
            status: JobStatus::parse(&self.status).unwrap_or(JobStatus::Failed),
            attempt_count: self.attempt_count.max(0) as u32,
            prior_attempts: self.prior_attempts.max(0) as u32,
            next_run_at: Timestamp::from(self.next_run_at),
            last_error: self.last_error,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_job_when_round_tripped_through_row_should_be_equal() {
        let job = WebhookJob::new_pending(
            SubscriptionId::new(),
            "task.created",
            json!({"id": "t1"}),
            Timestamp::now_utc(),
        );
        let row = WebhookJobRow::from_job(&job);
        assert!(row.is_pending());
        assert!(row.locked_by.is_none());
        assert_eq!(row.into_job(), job);
    }

    #[test]
    fn given_unknown_status_when_into_job_should_treat_as_failed() {
        let job = WebhookJob::new_pending(SubscriptionId::new(), "x", json!({}), Timestamp::now_utc());
        let mut row = WebhookJobRow::from_job(&job);
        row.status = "delivering".to_string();
        assert_eq!(row.into_job().status, JobStatus::Failed);
    }
}
