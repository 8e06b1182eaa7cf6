pub mod delivery_record_store;
pub mod subscription_store;
pub mod webhook_job_store;
