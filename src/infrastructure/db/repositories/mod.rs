pub mod delivery_record_repository;
pub mod factory;
pub mod subscription_repository;
pub mod webhook_job_repository;

pub use factory::Repositories;
