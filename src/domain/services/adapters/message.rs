//! Shared rendering model for the chat adapters.

use serde_json::Value;

const DESCRIPTION_MAX_CHARS: usize = 500;
const RAW_PAYLOAD_MAX_CHARS: usize = 900;

/// Field label and the payload keys it is read from, first match wins.
type FieldLabel = (&'static str, &'static [&'static str]);

const TASK_FIELDS: &[FieldLabel] = &[
    ("Status", &["status"]),
    ("Priority", &["priority"]),
    ("Assignee", &["assigneeName", "assignee"]),
    ("Project", &["projectName", "project"]),
    ("Due", &["dueDate", "due_date"]),
];
const MEMBER_FIELDS: &[FieldLabel] = &[
    ("Email", &["email"]),
    ("Role", &["role"]),
    ("Team", &["teamName", "team"]),
];
const MESSAGE_FIELDS: &[FieldLabel] = &[
    ("Author", &["authorName", "author", "senderName"]),
    ("Channel", &["channelName", "channel"]),
];
const PROJECT_FIELDS: &[FieldLabel] = &[("Status", &["status"]), ("Owner", &["ownerName", "owner"])];
const FILE_FIELDS: &[FieldLabel] = &[
    ("Size", &["size"]),
    ("Type", &["mimeType", "contentType"]),
    ("Uploaded by", &["uploadedBy", "uploaderName"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventNamespace {
    Task,
    Member,
    Message,
    Project,
    File,
    Other,
}

impl EventNamespace {
    pub fn of(event_name: &str) -> Self {
        match event_name.split('.').next().unwrap_or_default() {
            "task" => EventNamespace::Task,
            "member" => EventNamespace::Member,
            "message" => EventNamespace::Message,
            "project" => EventNamespace::Project,
            "file" => EventNamespace::File,
            _ => EventNamespace::Other,
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            EventNamespace::Task => "Task",
            EventNamespace::Member => "Member",
            EventNamespace::Message => "Message",
            EventNamespace::Project => "Project",
            EventNamespace::File => "File",
            EventNamespace::Other => "Event",
        }
    }

    /// Default accent color (0xRRGGBB).
    pub fn color(&self) -> u32 {
        match self {
            EventNamespace::Task => 0x3498DB,
            EventNamespace::Member => 0x9B59B6,
            EventNamespace::Message => 0x1ABC9C,
            EventNamespace::Project => 0x34495E,
            EventNamespace::File => 0x95A5A6,
            EventNamespace::Other => 0x7F8C8D,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" | "critical" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "medium" | "normal" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            Priority::Urgent => 0xE74C3C,
            Priority::High => 0xE67E22,
            Priority::Medium => 0xF1C40F,
            Priority::Low => 0x2ECC71,
        }
    }
}

/// Platform-neutral chat message derived from an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub namespace: EventNamespace,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
    pub priority: Option<Priority>,
}

impl ChatMessage {
    pub fn from_event(event_name: &str, payload: &Value) -> Self {
        let namespace = EventNamespace::of(event_name);
        let priority = text(payload, &["priority"]).and_then(|p| Priority::parse(&p));

        let (description, fields) = match namespace {
            EventNamespace::Task => (
                text(payload, &["title", "name"]),
                collect_fields(payload, TASK_FIELDS),
            ),
            EventNamespace::Member => (
                text(payload, &["name", "userName", "email"]),
                collect_fields(payload, MEMBER_FIELDS),
            ),
            EventNamespace::Message => (
                text(payload, &["content", "text", "body"]),
                collect_fields(payload, MESSAGE_FIELDS),
            ),
            EventNamespace::Project => (
                text(payload, &["name", "title"]),
                collect_fields(payload, PROJECT_FIELDS),
            ),
            EventNamespace::File => (
                text(payload, &["fileName", "name"]),
                collect_fields(payload, FILE_FIELDS),
            ),
            EventNamespace::Other => (Some(raw_payload(payload)), Vec::new()),
        };

        Self {
            namespace,
            title: title_for(namespace, event_name),
            description: description.map(|d| truncate_chars(&d, DESCRIPTION_MAX_CHARS)),
            fields,
            priority,
        }
    }

    /// Accent color, optionally driven by the payload's priority.
    pub fn color(&self, by_priority: bool) -> u32 {
        match self.priority {
            Some(priority) if by_priority => priority.color(),
            _ => self.namespace.color(),
        }
    }
}

fn title_for(namespace: EventNamespace, event_name: &str) -> String {
    if namespace == EventNamespace::Other {
        return format!("Event: {event_name}");
    }
    let action = event_name
        .split_once('.')
        .map(|(_, rest)| rest.replace(['.', '_'], " "))
        .unwrap_or_default();
    if action.trim().is_empty() {
        return namespace.noun().to_string();
    }
    format!("{} {}", namespace.noun(), action.trim())
}

fn text(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn collect_fields(payload: &Value, labels: &[FieldLabel]) -> Vec<(String, String)> {
    labels
        .iter()
        .filter_map(|(label, keys)| text(payload, keys).map(|value| (label.to_string(), value)))
        .collect()
}

fn raw_payload(payload: &Value) -> String {
    let compact = payload.to_string();
    format!("```{}```", truncate_chars(&compact, RAW_PAYLOAD_MAX_CHARS))
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
