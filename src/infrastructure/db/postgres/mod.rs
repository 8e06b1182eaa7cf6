mod database;
pub mod delivery_record_store_postgres;
pub mod subscription_store_postgres;
pub mod webhook_job_store_postgres;

pub use database::PostgresDatabase;
