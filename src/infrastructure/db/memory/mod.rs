//! In-process stores for local runs and tests. State lives only as long as
//! the process; nothing here is shared between worker processes.

pub mod delivery_record_store_memory;
pub mod subscription_store_memory;
pub mod webhook_job_store_memory;

pub use delivery_record_store_memory::InMemoryDeliveryRecordStore;
pub use subscription_store_memory::InMemorySubscriptionStore;
pub use webhook_job_store_memory::InMemoryWebhookJobStore;
