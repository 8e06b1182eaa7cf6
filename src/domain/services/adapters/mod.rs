//! Pure transforms from a queued job and its destination into an HTTP request.
//!
//! Adapters never perform I/O. Dispatch is a closed `match` over
//! [`AdapterType`]; unknown stored tags already resolve to the generic
//! adapter when the subscription is loaded.

pub mod chat_a;
pub mod chat_b;
pub mod generic;
pub mod message;

use crate::domain::entities::subscription::{AdapterType, Subscription};
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::value_objects::timestamps::Timestamp;
use std::collections::BTreeMap;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A fully built outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: String,
    pub method: &'static str,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptError {
    Serialization(String),
}

impl std::fmt::Display for AdaptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdaptError::Serialization(msg) => write!(f, "payload serialization failed: {msg}"),
        }
    }
}

/// Build the request for `job` in the format its subscription expects.
pub fn adapt(
    job: &WebhookJob,
    subscription: &Subscription,
    now: Timestamp,
) -> Result<OutboundRequest, AdaptError> {
    match subscription.adapter_type {
        AdapterType::ChatA => chat_a::adapt(job, subscription),
        AdapterType::ChatB => chat_b::adapt(job, subscription),
        AdapterType::Generic => generic::adapt(job, subscription, now),
    }
}

pub(crate) fn json_request(
    url: &str,
    body: &serde_json::Value,
) -> Result<OutboundRequest, AdaptError> {
    let body = serde_json::to_vec(body).map_err(|e| AdaptError::Serialization(e.to_string()))?;
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string());
    Ok(OutboundRequest {
        url: url.to_string(),
        method: "POST",
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ids::WorkspaceId;
    use serde_json::json;

    fn subscription(adapter_type: AdapterType) -> Subscription {
        Subscription::new(
            WorkspaceId::from("w1"),
            "https://hooks.example.com/in",
            adapter_type,
            Some("s3cr3t".to_string()),
            vec!["*".to_string()],
        )
    }

    #[test]
    fn given_each_adapter_when_adapt_should_post_json_to_subscription_url() {
        let now = Timestamp::now_utc();
        for adapter_type in [AdapterType::Generic, AdapterType::ChatA, AdapterType::ChatB] {
            let sub = subscription(adapter_type);
            let job = WebhookJob::new_pending(sub.id, "task.created", json!({"id": "t1"}), now);

            let request = adapt(&job, &sub, now).unwrap();

            assert_eq!(request.method, "POST");
            assert_eq!(request.url, sub.url);
            assert_eq!(
                request.headers.get("Content-Type").map(String::as_str),
                Some(CONTENT_TYPE_JSON)
            );
            assert!(serde_json::from_slice::<serde_json::Value>(&request.body).is_ok());
        }
    }

    #[test]
    fn given_unknown_stored_tag_when_adapt_should_use_generic_format() {
        let now = Timestamp::now_utc();
        let sub = subscription(AdapterType::parse("carrier_pigeon"));
        let job = WebhookJob::new_pending(sub.id, "task.created", json!({"id": "t1"}), now);

        let request = adapt(&job, &sub, now).unwrap();

        assert!(request.headers.contains_key(generic::HEADER_SIGNATURE));
        assert_eq!(request.body, br#"{"id":"t1"}"#.to_vec());
    }

    #[test]
    fn given_chat_adapters_when_adapt_should_never_sign() {
        let now = Timestamp::now_utc();
        for adapter_type in [AdapterType::ChatA, AdapterType::ChatB] {
            let sub = subscription(adapter_type);
            let job = WebhookJob::new_pending(sub.id, "task.created", json!({}), now);
            let request = adapt(&job, &sub, now).unwrap();
            assert!(!request.headers.contains_key(generic::HEADER_SIGNATURE));
            assert_eq!(request.headers.len(), 1);
        }
    }
}
