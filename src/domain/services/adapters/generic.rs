use crate::domain::entities::subscription::Subscription;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::adapters::{AdaptError, OutboundRequest, json_request};
use crate::domain::services::signer::Signer;
use crate::domain::value_objects::timestamps::Timestamp;

pub const HEADER_EVENT: &str = "X-Webhook-Event";
pub const HEADER_DELIVERY: &str = "X-Webhook-Delivery";
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";
pub const HEADER_TIMESTAMP: &str = "X-Webhook-Timestamp";

/// Signed JSON passthrough of the event payload.
///
/// Subscriptions without a secret are delivered without a signature header.
pub fn adapt(
    job: &WebhookJob,
    subscription: &Subscription,
    now: Timestamp,
) -> Result<OutboundRequest, AdaptError> {
    // Step 1: Serialize the payload exactly as stored.
    let mut request = json_request(&subscription.url, &job.payload)?;

    // Step 2: Attach event metadata.
    let timestamp_ms = now.unix_millis();
    request
        .headers
        .insert(HEADER_EVENT.to_string(), job.event_name.clone());
    request
        .headers
        .insert(HEADER_DELIVERY.to_string(), job.id.to_string());
    request
        .headers
        .insert(HEADER_TIMESTAMP.to_string(), timestamp_ms.to_string());

    // Step 3: Sign the exact body bytes.
    if let Some(secret) = subscription.secret.as_deref() {
        request.headers.insert(
            HEADER_SIGNATURE.to_string(),
            Signer::sign(&request.body, secret, timestamp_ms),
        );
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::AdapterType;
    use crate::domain::value_objects::ids::WorkspaceId;
    use serde_json::json;

    fn subscription(secret: Option<&str>) -> Subscription {
        Subscription::new(
            WorkspaceId::from("W1"),
            "https://integrator.example.com/hooks",
            AdapterType::Generic,
            secret.map(str::to_string),
            vec!["task.*".to_string()],
        )
    }

    #[test]
    fn given_payload_when_adapt_should_pass_body_through_and_sign_it() {
        let now = Timestamp::now_utc();
        let sub = subscription(Some("s3cr3t"));
        let payload = json!({"id": "t1", "title": "Fix bug", "nested": {"n": [1, 2.5, null]}});
        let job = WebhookJob::new_pending(sub.id, "task.created", payload.clone(), now);

        let request = adapt(&job, &sub, now).unwrap();

        assert_eq!(request.body, serde_json::to_vec(&payload).unwrap());
        assert_eq!(request.headers[HEADER_EVENT], "task.created");
        assert_eq!(request.headers[HEADER_DELIVERY], job.id.to_string());
        assert_eq!(request.headers[HEADER_TIMESTAMP], now.unix_millis().to_string());
        assert!(Signer::verify_at(
            &request.body,
            "s3cr3t",
            &request.headers[HEADER_SIGNATURE],
            now.unix_millis()
        ));
    }

    #[test]
    fn given_signature_header_when_inspected_should_embed_same_timestamp() {
        let now = Timestamp::now_utc();
        let sub = subscription(Some("s3cr3t"));
        let job = WebhookJob::new_pending(sub.id, "task.updated", json!({}), now);

        let request = adapt(&job, &sub, now).unwrap();

        let expected_prefix = format!("t={},v1=", request.headers[HEADER_TIMESTAMP]);
        assert!(request.headers[HEADER_SIGNATURE].starts_with(&expected_prefix));
    }

    #[test]
    fn given_no_secret_when_adapt_should_omit_signature() {
        let now = Timestamp::now_utc();
        let sub = subscription(None);
        let job = WebhookJob::new_pending(sub.id, "task.created", json!({"a": 1}), now);

        let request = adapt(&job, &sub, now).unwrap();

        assert!(!request.headers.contains_key(HEADER_SIGNATURE));
        assert!(request.headers.contains_key(HEADER_TIMESTAMP));
    }
}
