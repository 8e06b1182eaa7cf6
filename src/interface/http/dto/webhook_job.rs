use crate::domain::entities::webhook_job::WebhookJob;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Serialize)]
pub struct WebhookJobResponse {
    pub job_id: String,
    pub subscription_id: String,
    pub event_name: String,
    pub status: &'static str,
    pub attempt_count: u32,
    pub prior_attempts: u32,
    pub next_run_at: String,
    pub last_error: Option<String>,
}

impl From<WebhookJob> for WebhookJobResponse {
    fn from(job: WebhookJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            subscription_id: job.subscription_id.to_string(),
            event_name: job.event_name,
            status: job.status.as_str(),
            attempt_count: job.attempt_count,
            prior_attempts: job.prior_attempts,
            next_run_at: job.next_run_at.as_inner().format(&Rfc3339).unwrap_or_default(),
            last_error: job.last_error,
        }
    }
}
