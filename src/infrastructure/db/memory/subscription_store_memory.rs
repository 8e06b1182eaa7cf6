use crate::infrastructure::db::dto::SubscriptionRow;
use crate::infrastructure::db::stores::subscription_store::{
    SubscriptionRepositoryError, SubscriptionStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    rows: RwLock<HashMap<uuid::Uuid, SubscriptionRow>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn adjust_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
        f: impl FnOnce(i32) -> i32,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        let row = rows
            .get_mut(&subscription_id)
            .ok_or(SubscriptionRepositoryError::NotFound)?;
        row.consecutive_failure_count = f(row.consecutive_failure_count);
        row.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(
        &self,
        subscription_id: uuid::Uuid,
    ) -> Result<Option<SubscriptionRow>, SubscriptionRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        Ok(rows.get(&subscription_id).cloned())
    }

    async fn list_active_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<SubscriptionRow>, SubscriptionRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        let mut active: Vec<SubscriptionRow> = rows
            .values()
            .filter(|row| row.is_active && row.workspace_id == workspace_id)
            .cloned()
            .collect();
        active.sort_by_key(|row| row.created_at);
        Ok(active)
    }

    async fn insert(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        if rows.contains_key(&row.id) {
            return Err(SubscriptionRepositoryError::Conflict);
        }
        rows.insert(row.id, row.clone());
        Ok(row.clone())
    }

    async fn update(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        let Some(existing) = rows.get_mut(&row.id) else {
            return Err(SubscriptionRepositoryError::NotFound);
        };
        let created_at = existing.created_at;
        *existing = row.clone();
        existing.created_at = created_at;
        Ok(existing.clone())
    }

    async fn delete(&self, subscription_id: uuid::Uuid) -> Result<(), SubscriptionRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;
        match rows.remove(&subscription_id) {
            Some(_) => Ok(()),
            None => Err(SubscriptionRepositoryError::NotFound),
        }
    }

    async fn reset_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        match self.adjust_failure_count(subscription_id, now, |_| 0) {
            Err(SubscriptionRepositoryError::NotFound) => Ok(()),
            other => other,
        }
    }

    async fn increment_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.adjust_failure_count(subscription_id, now, |count| count.saturating_add(1))
    }
}
