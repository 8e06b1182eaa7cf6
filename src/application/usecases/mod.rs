pub mod delivery_loop;
pub mod get_delivery_stats;
pub mod list_deliveries;
pub mod retry_failed_job;
pub mod run_delivery_cycle;
pub mod trigger_event;
