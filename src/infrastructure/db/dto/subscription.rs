use crate::domain::entities::subscription::{AdapterType, Subscription, SubscriptionOptions};
use crate::domain::value_objects::ids::{SubscriptionId, WorkspaceId};
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: uuid::Uuid,
    pub workspace_id: String,
    pub url: String,
    pub adapter_type: String,
    pub secret: Option<String>,
    pub events: Vec<String>,
    pub is_active: bool,
    pub consecutive_failure_count: i32,
    pub options: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl SubscriptionRow {
    pub fn from_subscription(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.0,
            workspace_id: subscription.workspace_id.0.clone(),
            url: subscription.url.clone(),
            adapter_type: subscription.adapter_type.as_str().to_string(),
            secret: subscription.secret.clone(),
            events: subscription.events.clone(),
            is_active: subscription.is_active,
            consecutive_failure_count: subscription.consecutive_failure_count.min(i32::MAX as u32)
                as i32,
            options: serde_json::to_value(subscription.options)
                .unwrap_or_else(|_| serde_json::json!({})),
            created_at: subscription.created_at.as_inner(),
            updated_at: subscription.updated_at.as_inner(),
        }
    }

    pub fn into_subscription(self) -> Subscription {
        Subscription {
            id: SubscriptionId(self.id),
            workspace_id: WorkspaceId(self.workspace_id),
            url: self.url,
            adapter_type: AdapterType::parse(&self.adapter_type),
            secret: self.secret.filter(|s| !s.is_empty()),
            events: self.events,
            is_active: self.is_active,
            consecutive_failure_count: self.consecutive_failure_count.max(0) as u32,
            // Options written by older admin tooling may be partial or invalid.
            options: serde_json::from_value::<SubscriptionOptions>(self.options).unwrap_or_default(),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> SubscriptionRow {
        let now = OffsetDateTime::now_utc();
        SubscriptionRow {
            id: uuid::Uuid::new_v4(),
            workspace_id: "w1".to_string(),
            url: "https://example.com".to_string(),
            adapter_type: "chat_a".to_string(),
            secret: None,
            events: vec!["*".to_string()],
            is_active: true,
            consecutive_failure_count: 2,
            options: json!({"silent": true}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn given_row_when_into_subscription_should_map_fields() {
        let sub = row().into_subscription();
        assert_eq!(sub.adapter_type, AdapterType::ChatA);
        assert_eq!(sub.consecutive_failure_count, 2);
        assert!(sub.options.silent);
    }

    #[test]
    fn given_unknown_adapter_and_bad_options_when_mapped_should_fall_back() {
        let mut row = row();
        row.adapter_type = "pager".to_string();
        row.options = json!("not-an-object");
        let sub = row.into_subscription();
        assert_eq!(sub.adapter_type, AdapterType::Generic);
        assert_eq!(sub.options, SubscriptionOptions::default());
    }

    #[test]
    fn given_empty_secret_when_mapped_should_be_none() {
        let mut row = row();
        row.secret = Some(String::new());
        assert!(row.into_subscription().secret.is_none());
    }
}
