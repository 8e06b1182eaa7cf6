use crate::domain::value_objects::ids::{SubscriptionId, WebhookJobId};
use crate::domain::value_objects::timestamps::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One queued delivery chain for an (event occurrence, subscription) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookJob {
    pub id: WebhookJobId,
    pub subscription_id: SubscriptionId,
    pub event_name: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempt_count: u32,
    /// Attempts spent before the job was last re-armed.
    pub prior_attempts: u32,
    pub next_run_at: Timestamp,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRearmError {
    NotFailed,
}

impl WebhookJob {
    /// Build a job that is immediately eligible for claiming.
    pub fn new_pending(
        subscription_id: SubscriptionId,
        event_name: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self {
            id: WebhookJobId::new(),
            subscription_id,
            event_name: event_name.into(),
            payload,
            status: JobStatus::Pending,
            attempt_count: 0,
            prior_attempts: 0,
            next_run_at: now,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == JobStatus::Pending && self.next_run_at <= now
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }

    /// Index of the next attempt across the job's whole life, rearms included.
    pub fn attempt_index(&self) -> u32 {
        self.prior_attempts.saturating_add(self.attempt_count)
    }

    /// Put a permanently failed job back in the queue with a fresh retry budget.
    ///
    /// Spent attempts move to `prior_attempts` so logged attempt indexes keep
    /// increasing.
    pub fn rearm(&mut self, now: Timestamp) -> Result<(), JobRearmError> {
        if self.status != JobStatus::Failed {
            return Err(JobRearmError::NotFailed);
        }
        self.status = JobStatus::Pending;
        self.prior_attempts = self.attempt_index();
        self.attempt_count = 0;
        self.next_run_at = now;
        self.last_error = None;
        self.updated_at = now;
        Ok(())
    }
}
