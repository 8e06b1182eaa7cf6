use crate::domain::entities::subscription::Subscription;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::adapters::message::ChatMessage;
use crate::domain::services::adapters::{AdaptError, OutboundRequest, json_request};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

/// Discord-style flag that delivers the message without a push notification.
pub const SUPPRESS_NOTIFICATIONS: u32 = 1 << 12;
const MAX_FIELDS: usize = 25;

/// Embed-based chat message (`{"embeds": [...]}`).
pub fn adapt(job: &WebhookJob, subscription: &Subscription) -> Result<OutboundRequest, AdaptError> {
    let message = ChatMessage::from_event(&job.event_name, &job.payload);
    let body = render(job, subscription, &message);
    json_request(&subscription.url, &body)
}

fn render(job: &WebhookJob, subscription: &Subscription, message: &ChatMessage) -> Value {
    let fields: Vec<Value> = message
        .fields
        .iter()
        .take(MAX_FIELDS)
        .map(|(name, value)| json!({ "name": name, "value": value, "inline": true }))
        .collect();

    let mut embed = json!({
        "title": message.title,
        "color": message.color(subscription.options.color_by_priority),
        "fields": fields,
        "footer": { "text": job.event_name },
    });
    if let Some(description) = &message.description {
        embed["description"] = json!(description);
    }
    if let Ok(timestamp) = job.created_at.as_inner().format(&Rfc3339) {
        embed["timestamp"] = json!(timestamp);
    }

    let mut body = json!({ "embeds": [embed] });
    if subscription.options.silent {
        body["flags"] = json!(SUPPRESS_NOTIFICATIONS);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::{AdapterType, SubscriptionOptions};
    use crate::domain::services::adapters::message::{EventNamespace, Priority};
    use crate::domain::value_objects::ids::WorkspaceId;
    use crate::domain::value_objects::timestamps::Timestamp;

    fn subscription(options: SubscriptionOptions) -> Subscription {
        let mut sub = Subscription::new(
            WorkspaceId::from("w1"),
            "https://chat.example.com/api/webhooks/1/abc",
            AdapterType::ChatA,
            None,
            vec!["*".to_string()],
        );
        sub.options = options;
        sub
    }

    fn body(sub: &Subscription, event: &str, payload: Value) -> Value {
        let job = WebhookJob::new_pending(sub.id, event, payload, Timestamp::now_utc());
        let request = adapt(&job, sub).unwrap();
        serde_json::from_slice(&request.body).unwrap()
    }

    #[test]
    fn given_task_event_when_adapt_should_build_single_embed() {
        let sub = subscription(SubscriptionOptions::default());
        let body = body(&sub, "task.created", json!({"title": "Fix bug", "status": "todo"}));

        let embed = &body["embeds"][0];
        assert_eq!(embed["title"], "Task created");
        assert_eq!(embed["description"], "Fix bug");
        assert_eq!(embed["fields"][0]["name"], "Status");
        assert_eq!(embed["footer"]["text"], "task.created");
        assert_eq!(embed["color"], EventNamespace::Task.color());
        assert!(body.get("flags").is_none());
    }

    #[test]
    fn given_silent_option_when_adapt_should_suppress_notifications() {
        let sub = subscription(SubscriptionOptions {
            silent: true,
            color_by_priority: false,
        });
        let body = body(&sub, "member.added", json!({"name": "Ada"}));
        assert_eq!(body["flags"], SUPPRESS_NOTIFICATIONS);
    }

    #[test]
    fn given_priority_coloring_when_adapt_should_color_by_priority() {
        let sub = subscription(SubscriptionOptions {
            silent: false,
            color_by_priority: true,
        });
        let body = body(&sub, "task.updated", json!({"priority": "urgent"}));
        assert_eq!(body["embeds"][0]["color"], Priority::Urgent.color());
    }

    #[test]
    fn given_unknown_event_when_adapt_should_render_generic_title() {
        let sub = subscription(SubscriptionOptions::default());
        let body = body(&sub, "calendar.created", json!({}));
        assert_eq!(body["embeds"][0]["title"], "Event: calendar.created");
    }
}
