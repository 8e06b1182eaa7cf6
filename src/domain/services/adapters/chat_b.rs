use crate::domain::entities::subscription::Subscription;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::adapters::message::{ChatMessage, Priority};
use crate::domain::services::adapters::{AdaptError, OutboundRequest, json_request};
use serde_json::{Value, json};

const MAX_SECTION_FIELDS: usize = 10;
const CHANNEL_MENTION: &str = "<!channel>";

/// Block-based chat message (`{"text": ..., "blocks": [...]}`).
pub fn adapt(job: &WebhookJob, subscription: &Subscription) -> Result<OutboundRequest, AdaptError> {
    let message = ChatMessage::from_event(&job.event_name, &job.payload);
    let body = render(job, subscription, &message);
    json_request(&subscription.url, &body)
}

fn render(job: &WebhookJob, subscription: &Subscription, message: &ChatMessage) -> Value {
    let options = subscription.options;

    // Urgent items ping the channel unless the destination is silent.
    let text = if message.priority == Some(Priority::Urgent) && !options.silent {
        format!("{CHANNEL_MENTION} {}", message.title)
    } else {
        message.title.clone()
    };

    let mut blocks = vec![json!({
        "type": "header",
        "text": { "type": "plain_text", "text": message.title },
    })];
    if let Some(description) = &message.description {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": description },
        }));
    }
    if !message.fields.is_empty() {
        let fields: Vec<Value> = message
            .fields
            .iter()
            .take(MAX_SECTION_FIELDS)
            .map(|(name, value)| json!({ "type": "mrkdwn", "text": format!("*{name}*\n{value}") }))
            .collect();
        blocks.push(json!({ "type": "section", "fields": fields }));
    }
    blocks.push(json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": format!("`{}`", job.event_name) }],
    }));

    if options.color_by_priority {
        return json!({
            "text": text,
            "attachments": [{
                "color": format!("#{:06X}", message.color(true)),
                "blocks": blocks,
            }],
        });
    }

    json!({ "text": text, "blocks": blocks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::{AdapterType, SubscriptionOptions};
    use crate::domain::value_objects::ids::WorkspaceId;
    use crate::domain::value_objects::timestamps::Timestamp;

    fn subscription(options: SubscriptionOptions) -> Subscription {
        let mut sub = Subscription::new(
            WorkspaceId::from("w1"),
            "https://chat.example.com/services/T000/B000/XXX",
            AdapterType::ChatB,
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
    fn given_task_event_when_adapt_should_render_header_and_fields() {
        let sub = subscription(SubscriptionOptions::default());
        let body = body(
            &sub,
            "task.created",
            json!({"title": "Fix bug", "assignee": "ada"}),
        );

        assert_eq!(body["text"], "Task created");
        let blocks = body["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(blocks[0]["text"]["text"], "Task created");
        assert_eq!(blocks[1]["text"]["text"], "Fix bug");
        assert_eq!(blocks[2]["fields"][0]["text"], "*Assignee*\nada");
        assert_eq!(blocks.last().unwrap()["type"], "context");
        assert!(body.get("attachments").is_none());
    }

    #[test]
    fn given_urgent_priority_when_not_silent_should_mention_channel() {
        let sub = subscription(SubscriptionOptions::default());
        let body = body(&sub, "task.created", json!({"priority": "urgent"}));
        assert_eq!(body["text"], "<!channel> Task created");
    }

    #[test]
    fn given_urgent_priority_when_silent_should_not_mention_channel() {
        let sub = subscription(SubscriptionOptions {
            silent: true,
            color_by_priority: false,
        });
        let body = body(&sub, "task.created", json!({"priority": "urgent"}));
        assert_eq!(body["text"], "Task created");
    }

    #[test]
    fn given_priority_coloring_when_adapt_should_wrap_blocks_in_colored_attachment() {
        let sub = subscription(SubscriptionOptions {
            silent: false,
            color_by_priority: true,
        });
        let body = body(&sub, "task.updated", json!({"priority": "low"}));

        assert!(body.get("blocks").is_none());
        assert_eq!(body["attachments"][0]["color"], "#2ECC71");
        assert!(body["attachments"][0]["blocks"].is_array());
    }

    #[test]
    fn given_unknown_event_when_adapt_should_render_generic_title() {
        let sub = subscription(SubscriptionOptions::default());
        let body = body(&sub, "calendar.created", json!({"x": 1}));
        assert_eq!(body["blocks"][0]["text"]["text"], "Event: calendar.created");
    }
}
