use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::SubscriptionRow;
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for SubscriptionRepositoryError {
    fn from(_: DatabaseError) -> Self {
        SubscriptionRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch a subscription by its ID. Returns `None` if it doesn't exist.
    async fn get(
        &self,
        subscription_id: uuid::Uuid,
    ) -> Result<Option<SubscriptionRow>, SubscriptionRepositoryError>;
    /// List the active subscriptions of a workspace, oldest first.
    async fn list_active_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<SubscriptionRow>, SubscriptionRepositoryError>;
    /// Create a subscription and return exactly what was stored.
    async fn insert(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError>;
    /// Update a subscription and return exactly what was stored.
    async fn update(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError>;
    /// Delete a subscription by its ID. Returns an error if it doesn't exist.
    async fn delete(&self, subscription_id: uuid::Uuid) -> Result<(), SubscriptionRepositoryError>;
    /// Set the consecutive failure counter back to zero.
    async fn reset_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError>;
    /// Add one to the consecutive failure counter.
    async fn increment_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError>;
}

/// A no-op subscription store used when persistence is not configured.
pub struct DisabledSubscriptionStore;

#[async_trait]
impl SubscriptionStore for DisabledSubscriptionStore {
    async fn get(
        &self,
        _subscription_id: uuid::Uuid,
    ) -> Result<Option<SubscriptionRow>, SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn list_active_for_workspace(
        &self,
        _workspace_id: &str,
    ) -> Result<Vec<SubscriptionRow>, SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn insert(
        &self,
        _row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn update(
        &self,
        _row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn delete(
        &self,
        _subscription_id: uuid::Uuid,
    ) -> Result<(), SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn reset_failure_count(
        &self,
        _subscription_id: uuid::Uuid,
        _now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }

    async fn increment_failure_count(
        &self,
        _subscription_id: uuid::Uuid,
        _now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        Err(SubscriptionRepositoryError::StorageUnavailable)
    }
}
