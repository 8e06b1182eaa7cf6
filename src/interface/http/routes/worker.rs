// HTTP routes: on-demand delivery cycle for external schedulers.

use crate::application::usecases::run_delivery_cycle::{
    RunDeliveryCycleError, RunDeliveryCycleUseCase,
};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::interface::http::problem::{WHR_DELIVERY_ERROR, WHR_STORAGE_DB_ERROR, problem};
use crate::interface::http::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

/// Builds the worker trigger route.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/internal/webhooks/run", post(run_cycle))
}

/// Runs one delivery cycle and reports what it did.
async fn run_cycle(State(state): State<AppState>) -> Response {
    let result =
        RunDeliveryCycleUseCase::run_once(&state.ctx, &state.worker_id, Timestamp::now_utc()).await;

    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(RunDeliveryCycleError::Storage(detail)) => problem(
            StatusCode::SERVICE_UNAVAILABLE,
            WHR_STORAGE_DB_ERROR,
            Some(detail),
            None,
        ),
        Err(RunDeliveryCycleError::Delivery(detail)) => problem(
            StatusCode::INTERNAL_SERVER_ERROR,
            WHR_DELIVERY_ERROR,
            Some(detail),
            None,
        ),
    }
}
