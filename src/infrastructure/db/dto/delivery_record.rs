use crate::domain::entities::delivery_record::DeliveryRecord;
use crate::domain::value_objects::ids::{DeliveryRecordId, SubscriptionId, WebhookJobId};
use crate::domain::value_objects::timestamps::Timestamp;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryRecordRow {
    pub id: uuid::Uuid,
    pub subscription_id: uuid::Uuid,
    pub job_id: uuid::Uuid,
    pub event_name: String,
    pub payload: serde_json::Value,
    pub request_headers: serde_json::Value,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub attempt_index: i32,
    pub created_at: OffsetDateTime,
}

impl DeliveryRecordRow {
    pub fn from_record(record: &DeliveryRecord) -> Self {
        Self {
            id: record.id.0,
            subscription_id: record.subscription_id.0,
            job_id: record.job_id.0,
            event_name: record.event_name.clone(),
            payload: record.payload.clone(),
            request_headers: serde_json::to_value(&record.request_headers)
                .unwrap_or_else(|_| serde_json::json!({})),
            response_status: record.response_status.map(i32::from),
            response_body: record.response_body.clone(),
            error_message: record.error_message.clone(),
            duration_ms: record.duration_ms.min(i64::MAX as u64) as i64,
            attempt_index: record.attempt_index.min(i32::MAX as u32) as i32,
            created_at: record.created_at.as_inner(),
        }
    }

    pub fn into_record(self) -> DeliveryRecord {
        DeliveryRecord {
            id: DeliveryRecordId(self.id),
            subscription_id: SubscriptionId(self.subscription_id),
            job_id: WebhookJobId(self.job_id),
            event_name: self.event_name,
            payload: self.payload,
            request_headers: serde_json::from_value::<BTreeMap<String, String>>(
                self.request_headers,
            )
            .unwrap_or_default(),
            response_status: self.response_status.and_then(|s| u16::try_from(s).ok()),
            response_body: self.response_body,
            error_message: self.error_message,
            duration_ms: self.duration_ms.max(0) as u64,
            attempt_index: self.attempt_index.max(0) as u32,
            created_at: Timestamp::from(self.created_at),
        }
    }
}
