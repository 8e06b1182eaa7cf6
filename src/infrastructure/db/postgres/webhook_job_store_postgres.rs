use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{WebhookJobRow, WebhookJobStats};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_job_store::{
    WebhookJobRepositoryError, WebhookJobStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

const JOB_COLUMNS: &str = "id,
    subscription_id,
    event_name,
    payload,
    status,
    attempt_count,
    prior_attempts,
    next_run_at,
    last_error,
    locked_by,
    locked_until,
    created_at,
    updated_at";

#[derive(Clone)]
pub struct WebhookJobStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookJobStorePostgres {
    /// Build a Postgres-backed webhook job store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM webhook_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(job_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookJobRow,
    ) -> Result<WebhookJobRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO webhook_jobs ({JOB_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,NULL,NULL,$10,$11)
            RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(row.id)
            .bind(row.subscription_id)
            .bind(&row.event_name)
            .bind(&row.payload)
            .bind(&row.status)
            .bind(row.attempt_count)
            .bind(row.prior_attempts)
            .bind(row.next_run_at)
            .bind(&row.last_error)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn claim_due_impl_conn(
        conn: &mut PgConnection,
        now: OffsetDateTime,
        limit: u32,
        worker_id: &str,
        lease_until: OffsetDateTime,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        // Step 1: Lock due rows nobody else holds, then stamp our lease on them.
        let sql = format!(
            "WITH due AS (
                SELECT id
                FROM webhook_jobs
                WHERE status = 'pending'
                  AND next_run_at <= $1
                  AND (locked_until IS NULL OR locked_until <= $1)
                ORDER BY next_run_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT $2
            )
            UPDATE webhook_jobs
            SET locked_by = $3,
                locked_until = $4,
                updated_at = $1
            WHERE id IN (SELECT id FROM due)
            RETURNING {JOB_COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(now)
            .bind(i64::from(limit))
            .bind(worker_id)
            .bind(lease_until)
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        // Step 2: RETURNING order is unspecified.
        rows.sort_by_key(|row| row.next_run_at);
        Ok(rows)
    }

    /// With a `holder`, only a row still leased to that worker is touched.
    async fn update_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookJobRow,
        holder: Option<&str>,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let sql = format!(
            "UPDATE webhook_jobs SET
                status = $2,
                attempt_count = $3,
                prior_attempts = $4,
                next_run_at = $5,
                last_error = $6,
                locked_by = NULL,
                locked_until = NULL,
                updated_at = $7
            WHERE id = $1
              AND ($8::text IS NULL OR locked_by = $8)
            RETURNING {JOB_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, WebhookJobRow>(&sql)
            .bind(row.id)
            .bind(&row.status)
            .bind(row.attempt_count)
            .bind(row.prior_attempts)
            .bind(row.next_run_at)
            .bind(&row.last_error)
            .bind(row.updated_at)
            .bind(holder)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        match (stored, holder) {
            (Some(row), _) => Ok(row),
            (None, None) => Err(WebhookJobRepositoryError::NotFound),
            (None, Some(_)) => Err(WebhookJobRepositoryError::Conflict),
        }
    }

    /// With a `holder`, only a row still leased to that worker is deleted.
    async fn delete_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
        holder: Option<&str>,
    ) -> Result<(), WebhookJobRepositoryError> {
        let result = sqlx::query(
            "DELETE FROM webhook_jobs
            WHERE id = $1
              AND ($2::text IS NULL OR locked_by = $2)",
        )
        .bind(job_id)
        .bind(holder)
        .execute(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        if result.rows_affected() == 0 {
            return Err(match holder {
                None => WebhookJobRepositoryError::NotFound,
                Some(_) => WebhookJobRepositoryError::Conflict,
            });
        }

        Ok(())
    }

    async fn stats_impl_conn(
        conn: &mut PgConnection,
    ) -> Result<WebhookJobStats, WebhookJobRepositoryError> {
        let stats = sqlx::query_as::<_, WebhookJobStats>(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed
            FROM webhook_jobs",
        )
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| WebhookJobRepositoryError::StorageUnavailable)?;

        Ok(stats)
    }
}

#[async_trait]
impl WebhookJobStore for WebhookJobStorePostgres {
    async fn get(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Option<WebhookJobRow>, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, job_id)))
            .await
    }

    async fn insert_many(
        &self,
        rows: &[WebhookJobRow],
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let rows = rows.to_vec();
        let stored = self
            .db
            .with_tx(move |tx| {
                Box::pin(async move {
                    let mut stored = Vec::with_capacity(rows.len());
                    for row in &rows {
                        stored.push(Self::insert_impl_conn(&mut **tx, row).await?);
                    }
                    Ok::<_, DatabaseError>(stored)
                })
            })
            .await?;

        Ok(stored)
    }

    async fn claim_due(
        &self,
        now: OffsetDateTime,
        limit: u32,
        worker_id: &str,
        lease_until: OffsetDateTime,
    ) -> Result<Vec<WebhookJobRow>, WebhookJobRepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let worker_id = worker_id.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move {
                    Self::claim_due_impl_conn(conn, now, limit, &worker_id, lease_until).await
                })
            })
            .await
    }

    async fn update(&self, row: &WebhookJobRow) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::update_impl_conn(conn, &row, None).await })
            })
            .await
    }

    async fn release(
        &self,
        row: &WebhookJobRow,
        worker_id: &str,
    ) -> Result<WebhookJobRow, WebhookJobRepositoryError> {
        let row = row.clone();
        let worker_id = worker_id.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::update_impl_conn(conn, &row, Some(&worker_id)).await })
            })
            .await
    }

    async fn delete(&self, job_id: uuid::Uuid) -> Result<(), WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::delete_impl_conn(conn, job_id, None).await })
            })
            .await
    }

    async fn delete_leased(
        &self,
        job_id: uuid::Uuid,
        worker_id: &str,
    ) -> Result<(), WebhookJobRepositoryError> {
        let worker_id = worker_id.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move { Self::delete_impl_conn(conn, job_id, Some(&worker_id)).await })
            })
            .await
    }

    async fn stats(&self) -> Result<WebhookJobStats, WebhookJobRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::stats_impl_conn(conn)))
            .await
    }
}
