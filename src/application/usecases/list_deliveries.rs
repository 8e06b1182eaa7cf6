// Use case: list_deliveries.

use crate::application::context::AppContext;
use crate::domain::entities::delivery_record::DeliveryRecord;
use crate::domain::value_objects::ids::SubscriptionId;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

/// Reads the delivery log of one subscription, newest first.
pub struct ListDeliveriesUseCase;

#[derive(Debug, PartialEq, Eq)]
pub enum ListDeliveriesError {
    SubscriptionNotFound,
    Storage(String),
}

impl ListDeliveriesUseCase {
    pub async fn execute(
        ctx: &AppContext,
        subscription_id: SubscriptionId,
        limit: Option<u32>,
    ) -> Result<Vec<DeliveryRecord>, ListDeliveriesError> {
        // Step 1: Make sure the subscription exists.
        ctx.repos
            .subscription
            .get(subscription_id)
            .await
            .map_err(|e| ListDeliveriesError::Storage(format!("{e:?}")))?
            .ok_or(ListDeliveriesError::SubscriptionNotFound)?;

        // Step 2: Read the log with a clamped page size.
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        ctx.repos
            .delivery_record
            .list_by_subscription(subscription_id, limit)
            .await
            .map_err(|e| ListDeliveriesError::Storage(format!("{e:?}")))
    }
}
