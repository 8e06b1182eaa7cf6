use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::value_objects::ids::{DeliveryRecordId, SubscriptionId, WebhookJobId};
use crate::domain::value_objects::timestamps::Timestamp;
use std::collections::BTreeMap;

/// Immutable audit entry for a single delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub id: DeliveryRecordId,
    pub subscription_id: SubscriptionId,
    pub job_id: WebhookJobId,
    pub event_name: String,
    pub payload: serde_json::Value,
    pub request_headers: BTreeMap<String, String>,
    /// Absent when the request never produced a response.
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub attempt_index: u32,
    pub created_at: Timestamp,
}

/// What came back from the destination for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResponse {
    Received { status: u16, body: String },
    TransportError(String),
}

impl AttemptResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResponse::Received { status, .. } if (200..300).contains(status))
    }

    /// Error text persisted on the job for failed attempts.
    pub fn error_message(&self) -> Option<String> {
        match self {
            AttemptResponse::Received { status, .. } if (200..300).contains(status) => None,
            AttemptResponse::Received { status, .. } => Some(format!("http_status_{status}")),
            AttemptResponse::TransportError(err) => Some(err.clone()),
        }
    }
}

impl DeliveryRecord {
    /// Build the record for one attempt of `job`.
    ///
    /// `attempt_index` is the job's attempt count before this attempt.
    pub fn for_attempt(
        job: &WebhookJob,
        attempt_index: u32,
        request_headers: BTreeMap<String, String>,
        response: &AttemptResponse,
        duration_ms: u64,
        snippet_bytes: usize,
        now: Timestamp,
    ) -> Self {
        let (response_status, response_body) = match response {
            AttemptResponse::Received { status, body } => {
                (Some(*status), Some(truncate_utf8(body, snippet_bytes)))
            }
            AttemptResponse::TransportError(_) => (None, None),
        };

        Self {
            id: DeliveryRecordId::new(),
            subscription_id: job.subscription_id,
            job_id: job.id,
            event_name: job.event_name.clone(),
            payload: job.payload.clone(),
            request_headers,
            response_status,
            response_body,
            error_message: response.error_message(),
            duration_ms,
            attempt_index,
            created_at: now,
        }
    }
}

/// Cut `value` to at most `max_bytes` without splitting a character.
pub fn truncate_utf8(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}
