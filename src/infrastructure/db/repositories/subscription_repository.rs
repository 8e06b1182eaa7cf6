use crate::domain::entities::subscription::Subscription;
use crate::domain::value_objects::ids::{SubscriptionId, WorkspaceId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::SubscriptionRow;
use crate::infrastructure::db::stores::subscription_store::{
    SubscriptionRepositoryError, SubscriptionStore,
};
use std::sync::Arc;

pub struct SubscriptionRepository {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Fetch a subscription by its ID. Returns `None` if it doesn't exist.
    pub async fn get(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        let row = self.store.get(subscription_id.0).await?;
        Ok(row.map(SubscriptionRow::into_subscription))
    }

    /// Active subscriptions of a workspace. Event filtering is left to the caller.
    pub async fn list_active_for_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Subscription>, SubscriptionRepositoryError> {
        let rows = self
            .store
            .list_active_for_workspace(workspace_id.as_str())
            .await?;
        Ok(rows.into_iter().map(SubscriptionRow::into_subscription).collect())
    }

    pub async fn insert(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, SubscriptionRepositoryError> {
        let row = SubscriptionRow::from_subscription(subscription);
        let stored = self.store.insert(&row).await?;
        Ok(stored.into_subscription())
    }

    pub async fn update(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, SubscriptionRepositoryError> {
        let row = SubscriptionRow::from_subscription(subscription);
        let stored = self.store.update(&row).await?;
        Ok(stored.into_subscription())
    }

    pub async fn delete(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.store.delete(subscription_id.0).await
    }

    pub async fn reset_failure_count(
        &self,
        subscription_id: SubscriptionId,
        now: Timestamp,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.store
            .reset_failure_count(subscription_id.0, now.as_inner())
            .await
    }

    pub async fn increment_failure_count(
        &self,
        subscription_id: SubscriptionId,
        now: Timestamp,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.store
            .increment_failure_count(subscription_id.0, now.as_inner())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::AdapterType;
    use crate::infrastructure::db::memory::InMemorySubscriptionStore;

    fn repo() -> SubscriptionRepository {
        SubscriptionRepository::new(InMemorySubscriptionStore::arc())
    }

    fn subscription(workspace: &str) -> Subscription {
        Subscription::new(
            WorkspaceId::from(workspace),
            "https://example.com/hook",
            AdapterType::Generic,
            Some("s3cret".to_string()),
            vec!["*".to_string()],
        )
    }

    #[tokio::test]
    async fn given_mixed_workspaces_when_list_active_should_only_return_active_in_workspace() {
        let repo = repo();
        let keep = repo.insert(&subscription("w1")).await.unwrap();
        let mut inactive = subscription("w1");
        inactive.is_active = false;
        repo.insert(&inactive).await.unwrap();
        repo.insert(&subscription("w2")).await.unwrap();

        let listed = repo
            .list_active_for_workspace(&WorkspaceId::from("w1"))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
    }

    #[tokio::test]
    async fn given_failures_when_reset_should_return_counter_to_zero() {
        let repo = repo();
        let sub = repo.insert(&subscription("w1")).await.unwrap();
        let now = Timestamp::now_utc();

        repo.increment_failure_count(sub.id, now).await.unwrap();
        repo.increment_failure_count(sub.id, now).await.unwrap();
        let after_failures = repo.get(sub.id).await.unwrap().unwrap();
        repo.reset_failure_count(sub.id, now).await.unwrap();
        let after_reset = repo.get(sub.id).await.unwrap().unwrap();

        assert_eq!(after_failures.consecutive_failure_count, 2);
        assert_eq!(after_reset.consecutive_failure_count, 0);
    }

    #[tokio::test]
    async fn given_missing_subscription_when_delete_should_return_not_found() {
        let result = repo().delete(SubscriptionId::new()).await;

        assert_eq!(result, Err(SubscriptionRepositoryError::NotFound));
    }
}
