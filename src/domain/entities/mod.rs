pub mod delivery_record;
pub mod subscription;
pub mod webhook_job;
