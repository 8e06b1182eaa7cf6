use crate::infrastructure::db::dto::DeliveryRecordRow;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::delivery_record_store::{
    DeliveryRecordRepositoryError, DeliveryRecordStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;

const RECORD_COLUMNS: &str = "id,
    subscription_id,
    job_id,
    event_name,
    payload,
    request_headers,
    response_status,
    response_body,
    error_message,
    duration_ms,
    attempt_index,
    created_at";

#[derive(Clone)]
pub struct DeliveryRecordStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl DeliveryRecordStorePostgres {
    /// Build a Postgres-backed delivery log.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &DeliveryRecordRow,
    ) -> Result<DeliveryRecordRow, DeliveryRecordRepositoryError> {
        let sql = format!(
            "INSERT INTO webhook_delivery_records ({RECORD_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING {RECORD_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(row.id)
            .bind(row.subscription_id)
            .bind(row.job_id)
            .bind(&row.event_name)
            .bind(&row.payload)
            .bind(&row.request_headers)
            .bind(row.response_status)
            .bind(&row.response_body)
            .bind(&row.error_message)
            .bind(row.duration_ms)
            .bind(row.attempt_index)
            .bind(row.created_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DeliveryRecordRepositoryError::Conflict
                }
                _ => DeliveryRecordRepositoryError::StorageUnavailable,
            })?;

        Ok(stored)
    }

    async fn list_by_subscription_impl_conn(
        conn: &mut PgConnection,
        subscription_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
            FROM webhook_delivery_records
            WHERE subscription_id = $1
            ORDER BY created_at DESC, attempt_index DESC
            LIMIT $2"
        );
        let rows = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(subscription_id)
            .bind(i64::from(limit))
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| DeliveryRecordRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn list_by_job_impl_conn(
        conn: &mut PgConnection,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
            FROM webhook_delivery_records
            WHERE job_id = $1
            ORDER BY attempt_index ASC, created_at ASC"
        );
        let rows = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(job_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|_| DeliveryRecordRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }
}

#[async_trait]
impl DeliveryRecordStore for DeliveryRecordStorePostgres {
    async fn insert(
        &self,
        row: &DeliveryRecordRow,
    ) -> Result<DeliveryRecordRow, DeliveryRecordRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| Box::pin(async move { Self::insert_impl_conn(conn, &row).await }))
            .await
    }

    async fn list_by_subscription(
        &self,
        subscription_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::list_by_subscription_impl_conn(
                    conn,
                    subscription_id,
                    limit,
                ))
            })
            .await
    }

    async fn list_by_job(
        &self,
        job_id: uuid::Uuid,
    ) -> Result<Vec<DeliveryRecordRow>, DeliveryRecordRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::list_by_job_impl_conn(conn, job_id)))
            .await
    }
}
