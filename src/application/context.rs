use crate::config::WebhookDelivery;
use crate::infrastructure::db::repositories::Repositories;

/// Shared application resources used by use cases.
pub struct AppContext {
    pub repos: Repositories,
    pub delivery: WebhookDelivery,
}

impl AppContext {
    /// Build a new application context with shared repositories and delivery settings.
    pub fn new(repos: Repositories, delivery: WebhookDelivery) -> Self {
        Self { repos, delivery }
    }
}
