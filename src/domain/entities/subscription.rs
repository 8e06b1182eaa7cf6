use crate::domain::value_objects::ids::{SubscriptionId, WorkspaceId};
use crate::domain::value_objects::timestamps::Timestamp;
use serde::{Deserialize, Serialize};

/// Subscribed-event entry that matches every event name.
pub const WILDCARD: &str = "*";

/// Payload format a destination expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterType {
    Generic,
    ChatA,
    ChatB,
}

impl AdapterType {
    /// Parse a stored adapter tag. Unknown or empty tags map to `Generic`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat_a" | "chata" | "discord" => AdapterType::ChatA,
            "chat_b" | "chatb" | "slack" => AdapterType::ChatB,
            _ => AdapterType::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterType::Generic => "generic",
            AdapterType::ChatA => "chat_a",
            AdapterType::ChatB => "chat_b",
        }
    }
}

/// Rendering flags consulted by the chat adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionOptions {
    pub silent: bool,
    pub color_by_priority: bool,
}

/// A webhook destination registered by a workspace administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub workspace_id: WorkspaceId,
    pub url: String,
    pub adapter_type: AdapterType,
    /// Only the generic adapter signs with this.
    pub secret: Option<String>,
    pub events: Vec<String>,
    pub is_active: bool,
    /// Advisory circuit-breaker counter. Never gates delivery.
    pub consecutive_failure_count: u32,
    pub options: SubscriptionOptions,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    pub fn new(
        workspace_id: WorkspaceId,
        url: impl Into<String>,
        adapter_type: AdapterType,
        secret: Option<String>,
        events: Vec<String>,
    ) -> Self {
        let now = Timestamp::now_utc();
        Self {
            id: SubscriptionId::new(),
            workspace_id,
            url: url.into(),
            adapter_type,
            secret,
            events,
            is_active: true,
            consecutive_failure_count: 0,
            options: SubscriptionOptions::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when any subscribed entry matches `event_name`.
    pub fn matches_event(&self, event_name: &str) -> bool {
        self.events
            .iter()
            .any(|pattern| event_pattern_matches(pattern, event_name))
    }
}

/// Match a subscribed entry against a dot-namespaced event name.
///
/// Supported forms are the wildcard `*`, an exact name, and a namespace
/// pattern such as `task.*`, which matches `task.created` but not `taskboard.created`.
pub fn event_pattern_matches(pattern: &str, event_name: &str) -> bool {
    let pattern = pattern.trim();
    if pattern == WILDCARD || pattern == event_name {
        return true;
    }

    match pattern.strip_suffix(".*") {
        Some(namespace) if !namespace.is_empty() => event_name
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with('.')),
        _ => false,
    }
}
