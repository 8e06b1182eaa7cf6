use crate::infrastructure::db::dto::SubscriptionRow;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::subscription_store::{
    SubscriptionRepositoryError, SubscriptionStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

const SUBSCRIPTION_COLUMNS: &str = "id,
    workspace_id,
    url,
    adapter_type,
    secret,
    events,
    is_active,
    consecutive_failure_count,
    options,
    created_at,
    updated_at";

#[derive(Clone)]
pub struct SubscriptionStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl SubscriptionStorePostgres {
    /// Build a Postgres-backed subscription store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        subscription_id: uuid::Uuid,
    ) -> Result<Option<SubscriptionRow>, SubscriptionRepositoryError> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM webhook_subscriptions WHERE id = $1");
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(subscription_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn list_active_for_workspace_impl_conn(
        conn: &mut PgConnection,
        workspace_id: &str,
    ) -> Result<Vec<SubscriptionRow>, SubscriptionRepositoryError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS}
            FROM webhook_subscriptions
            WHERE workspace_id = $1
              AND is_active = TRUE
            ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(workspace_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let sql = format!(
            "INSERT INTO webhook_subscriptions ({SUBSCRIPTION_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(row.id)
            .bind(&row.workspace_id)
            .bind(&row.url)
            .bind(&row.adapter_type)
            .bind(&row.secret)
            .bind(&row.events)
            .bind(row.is_active)
            .bind(row.consecutive_failure_count)
            .bind(&row.options)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    SubscriptionRepositoryError::Conflict
                }
                _ => SubscriptionRepositoryError::StorageUnavailable,
            })?;

        Ok(stored)
    }

    async fn update_impl_conn(
        conn: &mut PgConnection,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let sql = format!(
            "UPDATE webhook_subscriptions SET
                workspace_id = $2,
                url = $3,
                adapter_type = $4,
                secret = $5,
                events = $6,
                is_active = $7,
                consecutive_failure_count = $8,
                options = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(row.id)
            .bind(&row.workspace_id)
            .bind(&row.url)
            .bind(&row.adapter_type)
            .bind(&row.secret)
            .bind(&row.events)
            .bind(row.is_active)
            .bind(row.consecutive_failure_count)
            .bind(&row.options)
            .bind(row.updated_at)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;

        match stored {
            Some(row) => Ok(row),
            None => Err(SubscriptionRepositoryError::NotFound),
        }
    }

    async fn delete_impl_conn(
        conn: &mut PgConnection,
        subscription_id: uuid::Uuid,
    ) -> Result<(), SubscriptionRepositoryError> {
        // Queued jobs go with it (ON DELETE CASCADE); delivery records stay.
        let result = sqlx::query("DELETE FROM webhook_subscriptions WHERE id = $1")
            .bind(subscription_id)
            .execute(&mut *conn)
            .await
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;

        if result.rows_affected() == 0 {
            return Err(SubscriptionRepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_failure_count_impl_conn(
        conn: &mut PgConnection,
        subscription_id: uuid::Uuid,
        increment: bool,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        let sql = if increment {
            "UPDATE webhook_subscriptions
            SET consecutive_failure_count = consecutive_failure_count + 1,
                updated_at = $2
            WHERE id = $1"
        } else {
            "UPDATE webhook_subscriptions
            SET consecutive_failure_count = 0,
                updated_at = $2
            WHERE id = $1
              AND consecutive_failure_count <> 0"
        };
        let result = sqlx::query(sql)
            .bind(subscription_id)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|_| SubscriptionRepositoryError::StorageUnavailable)?;

        if increment && result.rows_affected() == 0 {
            return Err(SubscriptionRepositoryError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionStorePostgres {
    async fn get(
        &self,
        subscription_id: uuid::Uuid,
    ) -> Result<Option<SubscriptionRow>, SubscriptionRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, subscription_id)))
            .await
    }

    async fn list_active_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<SubscriptionRow>, SubscriptionRepositoryError> {
        let workspace_id = workspace_id.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move {
                    Self::list_active_for_workspace_impl_conn(conn, &workspace_id).await
                })
            })
            .await
    }

    async fn insert(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| Box::pin(async move { Self::insert_impl_conn(conn, &row).await }))
            .await
    }

    async fn update(
        &self,
        row: &SubscriptionRow,
    ) -> Result<SubscriptionRow, SubscriptionRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| Box::pin(async move { Self::update_impl_conn(conn, &row).await }))
            .await
    }

    async fn delete(&self, subscription_id: uuid::Uuid) -> Result<(), SubscriptionRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::delete_impl_conn(conn, subscription_id)))
            .await
    }

    async fn reset_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::set_failure_count_impl_conn(
                    conn,
                    subscription_id,
                    false,
                    now,
                ))
            })
            .await
    }

    async fn increment_failure_count(
        &self,
        subscription_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<(), SubscriptionRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::set_failure_count_impl_conn(
                    conn,
                    subscription_id,
                    true,
                    now,
                ))
            })
            .await
    }
}
