// HTTP routes: queue inspection and manual retry.

use crate::application::usecases::get_delivery_stats::GetDeliveryStatsUseCase;
use crate::application::usecases::retry_failed_job::{
    RetryFailedJobError, RetryFailedJobUseCase,
};
use crate::domain::value_objects::ids::WebhookJobId;
use crate::domain::value_objects::timestamps::Timestamp;
use crate::interface::http::dto::webhook_job::WebhookJobResponse;
use crate::interface::http::problem::{
    WHR_JOB_CONFLICT, WHR_JOB_NOT_FOUND, WHR_REQUEST_MALFORMED, WHR_STORAGE_DB_ERROR, problem,
};
use crate::interface::http::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};

/// Builds webhook job routes.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/webhooks/stats", get(stats))
        .route("/webhook-jobs/:job_id/retry", post(retry_job))
}

/// Returns pending and failed job counts.
async fn stats(State(state): State<AppState>) -> Response {
    match GetDeliveryStatsUseCase::execute(&state.ctx).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(_) => problem(
            StatusCode::SERVICE_UNAVAILABLE,
            WHR_STORAGE_DB_ERROR,
            Some("storage unavailable".to_string()),
            None,
        ),
    }
}

/// Re-arms a permanently failed job.
async fn retry_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    // Step 1: Parse the job id.
    let Ok(job_id) = uuid::Uuid::parse_str(&job_id) else {
        return problem(
            StatusCode::BAD_REQUEST,
            WHR_REQUEST_MALFORMED,
            Some("job_id must be a UUID".to_string()),
            None,
        );
    };

    // Step 2: Execute the use case.
    let result =
        RetryFailedJobUseCase::execute(&state.ctx, WebhookJobId(job_id), Timestamp::now_utc())
            .await;

    // Step 3: Map output to HTTP response.
    match result {
        Ok(job) => (StatusCode::OK, Json(WebhookJobResponse::from(job))).into_response(),
        Err(RetryFailedJobError::NotFound) => problem(
            StatusCode::NOT_FOUND,
            WHR_JOB_NOT_FOUND,
            Some("job not found".to_string()),
            None,
        ),
        Err(RetryFailedJobError::NotFailed) => problem(
            StatusCode::CONFLICT,
            WHR_JOB_CONFLICT,
            Some("only failed jobs can be retried".to_string()),
            None,
        ),
        Err(RetryFailedJobError::Storage(_)) => problem(
            StatusCode::SERVICE_UNAVAILABLE,
            WHR_STORAGE_DB_ERROR,
            Some("storage unavailable".to_string()),
            None,
        ),
    }
}
