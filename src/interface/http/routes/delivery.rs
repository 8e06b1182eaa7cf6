// HTTP routes: delivery log.

use crate::application::usecases::list_deliveries::{ListDeliveriesError, ListDeliveriesUseCase};
use crate::domain::value_objects::ids::SubscriptionId;
use crate::interface::http::dto::delivery::{
    DeliveryRecordResponse, ListDeliveriesQuery, ListDeliveriesResponse,
};
use crate::interface::http::problem::{
    WHR_REQUEST_MALFORMED, WHR_STORAGE_DB_ERROR, WHR_SUBSCRIPTION_NOT_FOUND, problem,
};
use crate::interface::http::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

/// Builds delivery log routes.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/subscriptions/:subscription_id/deliveries",
        get(list_deliveries),
    )
}

/// Lists recent delivery attempts for a subscription.
async fn list_deliveries(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Response {
    let Ok(id) = uuid::Uuid::parse_str(&subscription_id) else {
        return problem(
            StatusCode::BAD_REQUEST,
            WHR_REQUEST_MALFORMED,
            Some("subscription_id must be a UUID".to_string()),
            None,
        );
    };

    match ListDeliveriesUseCase::execute(&state.ctx, SubscriptionId(id), query.limit).await {
        Ok(records) => {
            let response = ListDeliveriesResponse {
                subscription_id: id.to_string(),
                deliveries: records.into_iter().map(DeliveryRecordResponse::from).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(ListDeliveriesError::SubscriptionNotFound) => problem(
            StatusCode::NOT_FOUND,
            WHR_SUBSCRIPTION_NOT_FOUND,
            Some("subscription not found".to_string()),
            None,
        ),
        Err(ListDeliveriesError::Storage(_)) => problem(
            StatusCode::SERVICE_UNAVAILABLE,
            WHR_STORAGE_DB_ERROR,
            Some("storage unavailable".to_string()),
            None,
        ),
    }
}
