use crate::infrastructure::db::dto::{WebhookJobRow, WebhookJobStats};
use crate::infrastructure::db::stores::webhook_job_store::{
    WebhookJobRepositoryError, WebhookJobStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

/// Claims happen under the write lock, which gives the same guarantee as
/// `SKIP LOCKED`: two callers never lease the same job.
#[derive(Debug, Default)]
pub struct InMemoryWebhookJobStore {
    rows: RwLock<HashMap<uuid::Uuid, WebhookJobRow>>,
}

impl InMemoryWebhookJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of every stored row, lease columns included.
    pub fn rows(&self) -> Vec<WebhookJobRow> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn apply_update(existing: &mut WebhookJobRow, row: &WebhookJobRow) {
    existing.status = row.status.clone();
    existing.attempt_count = row.attempt_count;
    existing.prior_attempts = row.prior_attempts;
    existing.next_run_at = row.next_run_at;
    existing.last_error = row.last_error.clone();
    existing.locked_by = None;
    existing.locked_until = None;
    existing.updated_at = row.updated_at;
}

fn is_held_by(row: &WebhookJobRow, worker_id: &str) -> bool {
    row.locked_by.as_deref() == Some(worker_id)
}

fn is_claimable(row: &WebhookJobRow, now: OffsetDateTime) -> bool {
    row.is_pending()
        && row.next_run_at <= now
        && row.locked_until.is_none_or(|until| until <= now)
}

#[async_trait]
impl WebhookJobStore for InMemoryWebhookJobStore {
    async fn get(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        Ok(rows.get(&job_id).cloned())
    }

    async fn insert_many(
        &self,
        rows: &[WebhookJobRow],
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let mut stored = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        if rows.iter().any(|row| stored.contains_key(&row.id)) {
            return Err(WebhookJobRepositoryError::Conflict);
        }
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = row.clone();
            row.locked_by = None;
            row.locked_until = None;
            stored.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn claim_due(
        &self,
        now: OffsetDateTime,
        limit: u32,
        worker_id: &str,
        lease_until: OffsetDateTime,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        let mut due: Vec<(OffsetDateTime, uuid::Uuid)> = rows
            .values()
            .filter(|row| is_claimable(row, now))
            .map(|row| (row.next_run_at, row.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(row) = rows.get_mut(&id) {
                row.locked_by = Some(worker_id.to_string());
                row.locked_until = Some(lease_until);
                row.updated_at = now;
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn update(&self, row: &WebhookJobRow) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        let Some(existing) = rows.get_mut(&row.id) else {
            return Err(WebhookJobRepositoryError::NotFound);
        };
        apply_update(existing, row);
        Ok(existing.clone())
    }

    async fn release(
        &self,
        row: &WebhookJobRow,
        worker_id: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        match rows.get_mut(&row.id) {
            Some(existing) if is_held_by(existing, worker_id) => {
                apply_update(existing, row);
                Ok(existing.clone())
            }
            _ => Err(WebhookJobRepositoryError::Conflict),
        }
    }

    async fn delete(&self, job_id: uuid::Uuid) -> Result<(), WebhookJobRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        match rows.remove(&job_id) {
            Some(_) => Ok(()),
            None => Err(WebhookJobRepositoryError::NotFound),
        }
    }

    async fn delete_leased(
        &self,
        job_id: uuid::Uuid,
        worker_id: &str,
    ) -> Result<(), WebhookJobRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        if !rows.get(&job_id).is_some_and(|row| is_held_by(row, worker_id)) {
            return Err(WebhookJobRepositoryError::Conflict);
        }
        rows.remove(&job_id);
        Ok(())
    }

    async fn stats(&self) -> Result<WebhookJobStats, WebhookJobRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;
        let mut stats = WebhookJobStats::default();
        for row in rows.values() {
            if row.is_pending() {
                stats.pending += 1;
            } else if row.is_failed() {
                stats.failed += 1;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::webhook_job::WebhookJob;
    use crate::domain::value_objects::ids::SubscriptionId;
    use crate::domain::value_objects::timestamps::Timestamp;
    use serde_json::json;
    use time::Duration;
    use time::macros::datetime;

    fn pending_row(now: OffsetDateTime) -> WebhookJobRow {
        let job = WebhookJob::new_pending(
            SubscriptionId::new(),
            "task.created",
            json!({}),
            Timestamp::from(now),
        );
        WebhookJobRow::from_job(&job)
    }

    #[tokio::test]
    async fn given_due_jobs_when_two_workers_claim_should_not_share_jobs() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        let rows: Vec<_> = (0..5).map(|_| pending_row(now)).collect();
        store.insert_many(&rows).await.unwrap();

        let lease = now + Duration::minutes(5);
        let first = store.claim_due(now, 3, "w1", lease).await.unwrap();
        let second = store.claim_due(now, 10, "w2", lease).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert!(
            first
                .iter()
                .all(|a| second.iter().all(|b| a.id != b.id))
        );
    }

    #[tokio::test]
    async fn given_expired_lease_when_claim_should_reclaim_job() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        store.insert_many(&[pending_row(now)]).await.unwrap();

        let lease = now + Duration::minutes(5);
        assert_eq!(store.claim_due(now, 10, "w1", lease).await.unwrap().len(), 1);
        assert!(store.claim_due(now, 10, "w2", lease).await.unwrap().is_empty());

        let later = lease + Duration::seconds(1);
        let reclaimed = store
            .claim_due(later, 10, "w2", later + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].locked_by.as_deref(), Some("w2"));
    }

    #[tokio::test]
    async fn given_future_job_when_claim_should_skip_until_due() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        let mut row = pending_row(now);
        row.next_run_at = now + Duration::seconds(30);
        store.insert_many(&[row]).await.unwrap();

        let lease = now + Duration::minutes(5);
        assert!(store.claim_due(now, 10, "w1", lease).await.unwrap().is_empty());
        let due = now + Duration::seconds(30);
        assert_eq!(store.claim_due(due, 10, "w1", lease).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn given_claimed_job_when_update_should_release_lease() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        store.insert_many(&[pending_row(now)]).await.unwrap();
        let mut claimed = store
            .claim_due(now, 1, "w1", now + Duration::minutes(5))
            .await
            .unwrap();
        let mut row = claimed.remove(0);
        row.attempt_count = 1;

        let stored = store.update(&row).await.unwrap();

        assert_eq!(stored.attempt_count, 1);
        assert!(stored.locked_by.is_none());
        assert!(stored.locked_until.is_none());
    }

    #[tokio::test]
    async fn given_lease_taken_over_when_stale_worker_releases_should_conflict() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        store.insert_many(&[pending_row(now)]).await.unwrap();
        let mut stale = store
            .claim_due(now, 1, "w1", now + Duration::seconds(10))
            .await
            .unwrap()
            .remove(0);
        let later = now + Duration::seconds(11);
        store
            .claim_due(later, 1, "w2", later + Duration::seconds(10))
            .await
            .unwrap();
        stale.attempt_count = 1;

        let released = store.release(&stale, "w1").await;
        let deleted = store.delete_leased(stale.id, "w1").await;

        assert_eq!(released.unwrap_err(), WebhookJobRepositoryError::Conflict);
        assert_eq!(deleted.unwrap_err(), WebhookJobRepositoryError::Conflict);
        let current = store.get(stale.id).await.unwrap().unwrap();
        assert_eq!(current.locked_by.as_deref(), Some("w2"));
        assert_eq!(current.attempt_count, 0);
    }

    #[tokio::test]
    async fn given_lease_holder_when_delete_leased_should_remove_job() {
        let now = datetime!(2026-01-01 0:00 UTC);
        let store = InMemoryWebhookJobStore::new();
        store.insert_many(&[pending_row(now)]).await.unwrap();
        let claimed = store
            .claim_due(now, 1, "w1", now + Duration::seconds(10))
            .await
            .unwrap()
            .remove(0);

        store.delete_leased(claimed.id, "w1").await.unwrap();

        assert!(store.get(claimed.id).await.unwrap().is_none());
    }
}
