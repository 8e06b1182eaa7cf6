pub mod delivery;
pub mod health;
pub mod metrics;
pub mod ready;
pub mod webhook_job;
pub mod worker;
