use std::sync::Arc;

use crate::infrastructure::db::database::{Database, DatabaseError};
use crate::infrastructure::db::memory::{
    InMemoryDeliveryRecordStore, InMemorySubscriptionStore, InMemoryWebhookJobStore,
};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::postgres::delivery_record_store_postgres::DeliveryRecordStorePostgres;
use crate::infrastructure::db::postgres::subscription_store_postgres::SubscriptionStorePostgres;
use crate::infrastructure::db::postgres::webhook_job_store_postgres::WebhookJobStorePostgres;
use crate::infrastructure::db::repositories::delivery_record_repository::DeliveryRecordRepository;
use crate::infrastructure::db::repositories::subscription_repository::SubscriptionRepository;
use crate::infrastructure::db::repositories::webhook_job_repository::WebhookJobRepository;
use crate::infrastructure::db::stores::delivery_record_store::DisabledDeliveryRecordStore;
use crate::infrastructure::db::stores::subscription_store::DisabledSubscriptionStore;
use crate::infrastructure::db::stores::webhook_job_store::DisabledWebhookJobStore;

#[derive(Clone)]
enum Backend {
    Postgres(Arc<PostgresDatabase>),
    InMemory,
    Disabled,
}

#[derive(Clone)]
pub struct Repositories {
    backend: Backend,
    pub subscription: Arc<SubscriptionRepository>,
    pub webhook_job: Arc<WebhookJobRepository>,
    pub delivery_record: Arc<DeliveryRecordRepository>,
}

impl Repositories {
    /// Build all repositories backed by Postgres stores.
    pub fn postgres(db: Arc<PostgresDatabase>) -> Self {
        let subscription_store = Arc::new(SubscriptionStorePostgres::new(db.clone()));
        let job_store = Arc::new(WebhookJobStorePostgres::new(db.clone()));
        let record_store = Arc::new(DeliveryRecordStorePostgres::new(db.clone()));

        Self {
            backend: Backend::Postgres(db),
            subscription: Arc::new(SubscriptionRepository::new(subscription_store)),
            webhook_job: Arc::new(WebhookJobRepository::new(job_store)),
            delivery_record: Arc::new(DeliveryRecordRepository::new(record_store)),
        }
    }

    /// Build all repositories backed by process-local stores.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InMemory,
            subscription: Arc::new(SubscriptionRepository::new(InMemorySubscriptionStore::arc())),
            webhook_job: Arc::new(WebhookJobRepository::new(InMemoryWebhookJobStore::arc())),
            delivery_record: Arc::new(DeliveryRecordRepository::new(
                InMemoryDeliveryRecordStore::arc(),
            )),
        }
    }

    /// Repositories whose every call fails with `StorageUnavailable`.
    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
            subscription: Arc::new(SubscriptionRepository::new(Arc::new(
                DisabledSubscriptionStore,
            ))),
            webhook_job: Arc::new(WebhookJobRepository::new(Arc::new(DisabledWebhookJobStore))),
            delivery_record: Arc::new(DeliveryRecordRepository::new(Arc::new(
                DisabledDeliveryRecordStore,
            ))),
        }
    }

    /// Check that the backing storage can serve requests.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        match &self.backend {
            Backend::Postgres(db) => db.ping().await,
            Backend::InMemory => Ok(()),
            Backend::Disabled => Err(DatabaseError::Connection("db_unavailable".to_string())),
        }
    }
}
