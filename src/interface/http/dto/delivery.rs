use crate::domain::entities::delivery_record::DeliveryRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryRecordResponse {
    pub id: String,
    pub job_id: String,
    pub event_name: String,
    pub attempt_index: u32,
    pub request_headers: BTreeMap<String, String>,
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListDeliveriesResponse {
    pub subscription_id: String,
    pub deliveries: Vec<DeliveryRecordResponse>,
}

impl From<DeliveryRecord> for DeliveryRecordResponse {
    fn from(record: DeliveryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            job_id: record.job_id.to_string(),
            event_name: record.event_name,
            attempt_index: record.attempt_index,
            request_headers: record.request_headers,
            response_status: record.response_status,
            response_body: record.response_body,
            error_message: record.error_message,
            duration_ms: record.duration_ms,
            created_at: record.created_at.as_inner().format(&Rfc3339).unwrap_or_default(),
        }
    }
}
