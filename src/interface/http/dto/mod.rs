pub mod delivery;
pub mod webhook_job;
