// Use case: get_delivery_stats.

use crate::application::context::AppContext;
use serde::Serialize;

/// Reports how many webhook jobs are waiting and how many gave up.
pub struct GetDeliveryStatsUseCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub pending: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub enum GetDeliveryStatsError {
    Storage(String),
}

impl GetDeliveryStatsUseCase {
    pub async fn execute(ctx: &AppContext) -> Result<DeliveryStats, GetDeliveryStatsError> {
        let stats = ctx
            .repos
            .webhook_job
            .stats()
            .await
            .map_err(|e| GetDeliveryStatsError::Storage(format!("{e:?}")))?;

        Ok(DeliveryStats {
            pending: stats.pending.max(0) as u64,
            failed: stats.failed.max(0) as u64,
        })
    }
}
