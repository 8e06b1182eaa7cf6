// Use case: run_delivery_cycle.

use crate::application::context::AppContext;
use crate::domain::entities::delivery_record::{AttemptResponse, DeliveryRecord};
use crate::domain::entities::subscription::Subscription;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::adapters::{self, OutboundRequest};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::domain::workflows::delivery_state_machine::{DeliveryStateMachine, JobTransition};
use futures::StreamExt;
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Claims due webhook jobs and delivers them once.
pub struct RunDeliveryCycleUseCase;

#[derive(Debug)]
pub enum RunDeliveryCycleError {
    Storage(String),
    Delivery(String),
}

impl std::fmt::Display for RunDeliveryCycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunDeliveryCycleError::Storage(msg) => write!(f, "storage error: {msg}"),
            RunDeliveryCycleError::Delivery(msg) => write!(f, "delivery error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryCycleResult {
    pub claimed: usize,
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
    pub orphaned: usize,
    /// Jobs whose outcome could not be persisted; their lease expires and
    /// they are claimed again.
    pub errored: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Delivered,
    Retried,
    Failed,
    Orphaned,
    Errored,
}

impl JobOutcome {
    fn label(self) -> &'static str {
        match self {
            JobOutcome::Delivered => "delivered",
            JobOutcome::Retried => "retried",
            JobOutcome::Failed => "failed",
            JobOutcome::Orphaned => "orphaned",
            JobOutcome::Errored => "errored",
        }
    }
}

impl DeliveryCycleResult {
    fn tally(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Delivered => self.delivered += 1,
            JobOutcome::Retried => self.retried += 1,
            JobOutcome::Failed => self.failed += 1,
            JobOutcome::Orphaned => self.orphaned += 1,
            JobOutcome::Errored => self.errored += 1,
        }
    }
}

/// The claim a job is processed under.
#[derive(Clone, Copy)]
struct Lease<'a> {
    worker_id: &'a str,
    /// Latest instant a request may start and still finish inside the lease.
    start_deadline: Instant,
}

/// Read at most `limit` bytes of the response body, cut on a UTF-8 boundary.
async fn read_snippet(mut response: reqwest::Response, limit: usize) -> String {
    let mut buf: Vec<u8> = Vec::with_capacity(limit.min(8 * 1024));
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    match std::str::from_utf8(&buf) {
        Ok(text) => text.to_string(),
        Err(err) if err.error_len().is_none() => {
            String::from_utf8_lossy(&buf[..err.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(&buf).into_owned(),
    }
}

impl RunDeliveryCycleUseCase {
    /// Claim up to `batch_size` due jobs for `worker_id` and attempt each once.
    ///
    /// Only a failed claim aborts the cycle. Problems with a single job are
    /// logged and counted in the result.
    #[instrument(skip(ctx), fields(batch_size = ctx.delivery.batch_size))]
    pub async fn run_once(
        ctx: &AppContext,
        worker_id: &str,
        now: Timestamp,
    ) -> Result<DeliveryCycleResult, RunDeliveryCycleError> {
        // Step 1: Lease due jobs so no concurrent worker receives them.
        let claimed_at = Instant::now();
        let lease_until = now.plus(ctx.delivery.lease());
        let jobs = ctx
            .repos
            .webhook_job
            .claim_due(now, ctx.delivery.batch_size, worker_id, lease_until)
            .await
            .map_err(|e| RunDeliveryCycleError::Storage(format!("{e:?}")))?;

        let mut result = DeliveryCycleResult {
            claimed: jobs.len(),
            ..DeliveryCycleResult::default()
        };
        if jobs.is_empty() {
            return Ok(result);
        }

        // Step 2: Build an HTTP client with the configured timeout.
        let client = reqwest::Client::builder()
            .timeout(ctx.delivery.request_timeout())
            .build()
            .map_err(|e| RunDeliveryCycleError::Delivery(e.to_string()))?;

        // Step 3: Deliver the batch with bounded concurrency.
        let lease = Lease {
            worker_id,
            start_deadline: claimed_at + ctx.delivery.start_window(),
        };
        let outcomes: Vec<JobOutcome> = futures::stream::iter(jobs)
            .map(|job| Self::process_job(ctx, client.clone(), job, lease, now))
            .buffer_unordered(ctx.delivery.concurrency.max(1))
            .collect()
            .await;
        for outcome in outcomes {
            counter!("webhook_deliveries_total", "outcome" => outcome.label()).increment(1);
            result.tally(outcome);
        }

        // Step 4: Return summary stats for observability.
        info!(
            worker_id,
            claimed = result.claimed,
            delivered = result.delivered,
            retried = result.retried,
            failed = result.failed,
            orphaned = result.orphaned,
            errored = result.errored,
            "webhook delivery cycle finished"
        );
        Ok(result)
    }

    async fn process_job(
        ctx: &AppContext,
        client: reqwest::Client,
        mut job: WebhookJob,
        lease: Lease<'_>,
        now: Timestamp,
    ) -> JobOutcome {
        // Step 1: Resolve the destination; orphaned jobs are dropped without an attempt.
        let subscription = match ctx.repos.subscription.get(job.subscription_id).await {
            Ok(Some(sub)) if sub.is_active => sub,
            Ok(_) => return Self::drop_orphan(ctx, &job, lease.worker_id).await,
            Err(err) => {
                error!(job_id = %job.id, error = ?err, "failed to load webhook subscription");
                return JobOutcome::Errored;
            }
        };

        // Step 2: Leave the job to its lease expiry if the request could outlive the lease.
        if Instant::now() > lease.start_deadline {
            warn!(job_id = %job.id, "lease too close to expiry, skipping delivery");
            return JobOutcome::Errored;
        }

        // Step 3: Build and send the request.
        let attempt_index = job.attempt_index();
        let snippet_bytes = ctx.delivery.response_snippet_bytes;
        let started = Instant::now();
        let (headers, response) = match adapters::adapt(&job, &subscription, now) {
            Ok(request) => {
                let headers = request.headers.clone();
                (headers, Self::send(&client, request, snippet_bytes).await)
            }
            Err(err) => (
                BTreeMap::new(),
                AttemptResponse::TransportError(format!("adapter_error: {err}")),
            ),
        };
        let duration_ms = started.elapsed().as_millis().min(u64::MAX as u128) as u64;
        histogram!("webhook_delivery_duration_ms").record(duration_ms as f64);

        // Step 4: Record the attempt. An unrecorded attempt leaves the job
        // untouched, so it is retried once the lease expires.
        let record = DeliveryRecord::for_attempt(
            &job,
            attempt_index,
            headers,
            &response,
            duration_ms,
            snippet_bytes,
            now,
        );
        if let Err(err) = ctx.repos.delivery_record.record(&record).await {
            error!(job_id = %job.id, error = ?err, "failed to write delivery record");
            return JobOutcome::Errored;
        }

        // Step 5: Move the job forward.
        let policy = ctx.delivery.retry_policy();
        let transition = match DeliveryStateMachine::apply(&mut job, &response, &policy, now) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(job_id = %job.id, error = ?err, "claimed job is not deliverable");
                return JobOutcome::Errored;
            }
        };
        Self::persist_transition(ctx, &job, &subscription, transition, lease.worker_id, now).await
    }

    async fn send(
        client: &reqwest::Client,
        request: OutboundRequest,
        snippet_bytes: usize,
    ) -> AttemptResponse {
        let method =
            reqwest::Method::from_bytes(request.method.as_bytes()).unwrap_or(reqwest::Method::POST);
        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match builder.body(request.body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = read_snippet(response, snippet_bytes).await;
                AttemptResponse::Received { status, body }
            }
            Err(err) if err.is_timeout() => AttemptResponse::TransportError("timeout".to_string()),
            Err(err) => AttemptResponse::TransportError(err.to_string()),
        }
    }

    async fn persist_transition(
        ctx: &AppContext,
        job: &WebhookJob,
        subscription: &Subscription,
        transition: JobTransition,
        worker_id: &str,
        now: Timestamp,
    ) -> JobOutcome {
        match transition {
            JobTransition::Remove => {
                if let Err(err) = ctx.repos.webhook_job.delete_leased(job.id, worker_id).await {
                    error!(job_id = %job.id, error = ?err, "failed to remove delivered job");
                    return JobOutcome::Errored;
                }
                if let Err(err) = ctx
                    .repos
                    .subscription
                    .reset_failure_count(subscription.id, now)
                    .await
                {
                    warn!(subscription_id = %subscription.id, error = ?err, "failed to reset failure count");
                }
                JobOutcome::Delivered
            }
            JobTransition::Reschedule { next_run_at } => {
                if let Err(err) = ctx.repos.webhook_job.release(job, worker_id).await {
                    error!(job_id = %job.id, error = ?err, "failed to reschedule job");
                    return JobOutcome::Errored;
                }
                info!(
                    job_id = %job.id,
                    attempt = job.attempt_count,
                    next_run_at = %next_run_at.as_inner(),
                    last_error = job.last_error.as_deref().unwrap_or(""),
                    "webhook delivery failed, retry scheduled"
                );
                JobOutcome::Retried
            }
            JobTransition::Exhaust => {
                if let Err(err) = ctx.repos.webhook_job.release(job, worker_id).await {
                    error!(job_id = %job.id, error = ?err, "failed to mark job as failed");
                    return JobOutcome::Errored;
                }
                if let Err(err) = ctx
                    .repos
                    .subscription
                    .increment_failure_count(subscription.id, now)
                    .await
                {
                    warn!(subscription_id = %subscription.id, error = ?err, "failed to bump failure count");
                }
                warn!(
                    job_id = %job.id,
                    subscription_id = %subscription.id,
                    attempts = job.attempt_count,
                    last_error = job.last_error.as_deref().unwrap_or(""),
                    "webhook delivery permanently failed"
                );
                JobOutcome::Failed
            }
        }
    }

    async fn drop_orphan(ctx: &AppContext, job: &WebhookJob, worker_id: &str) -> JobOutcome {
        counter!("webhook_jobs_orphaned_total").increment(1);
        match ctx.repos.webhook_job.delete_leased(job.id, worker_id).await {
            Ok(()) => {
                info!(job_id = %job.id, subscription_id = %job.subscription_id, "dropped orphaned webhook job");
                JobOutcome::Orphaned
            }
            Err(err) => {
                error!(job_id = %job.id, error = ?err, "failed to drop orphaned job");
                JobOutcome::Errored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::test_support::{in_memory_context, unavailable_context};
    use crate::domain::entities::subscription::AdapterType;
    use crate::domain::entities::webhook_job::JobStatus;
    use crate::domain::value_objects::ids::WorkspaceId;
    use crate::infrastructure::db::repositories::delivery_record_repository::DeliveryRecordRepository;
    use crate::infrastructure::db::stores::delivery_record_store::DisabledDeliveryRecordStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn seed(ctx: &AppContext, url: &str, now: Timestamp) -> (Subscription, WebhookJob) {
        let sub = Subscription::new(
            WorkspaceId::from("w1"),
            url,
            AdapterType::Generic,
            None,
            vec!["*".to_string()],
        );
        let sub = ctx.repos.subscription.insert(&sub).await.unwrap();
        let job = WebhookJob::new_pending(sub.id, "task.created", json!({"id": "t1"}), now);
        let mut stored = ctx.repos.webhook_job.insert_many(&[job]).await.unwrap();
        (sub, stored.remove(0))
    }

    #[tokio::test]
    async fn given_empty_queue_when_run_once_should_claim_nothing() {
        let ctx = in_memory_context();

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", Timestamp::now_utc())
            .await
            .unwrap();

        assert_eq!(result, DeliveryCycleResult::default());
    }

    #[tokio::test]
    async fn given_storage_unavailable_when_run_once_should_return_storage_error() {
        let ctx = unavailable_context();

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", Timestamp::now_utc()).await;

        assert!(matches!(result, Err(RunDeliveryCycleError::Storage(_))));
    }

    #[tokio::test]
    async fn given_deleted_subscription_when_run_once_should_drop_job_without_record() {
        let ctx = in_memory_context();
        let now = Timestamp::now_utc();
        let (sub, job) = seed(&ctx, "http://127.0.0.1:9/hook", now).await;
        ctx.repos.subscription.delete(sub.id).await.unwrap();

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", now).await.unwrap();

        assert_eq!(result.orphaned, 1);
        assert!(ctx.repos.webhook_job.get(job.id).await.unwrap().is_none());
        assert!(
            ctx.repos
                .delivery_record
                .list_by_job(job.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn given_unreachable_destination_when_run_once_should_reschedule_with_backoff() {
        let ctx = in_memory_context();
        let now = Timestamp::now_utc();
        // Port 9 (discard) is not listening locally, so the connection is refused.
        let (_, job) = seed(&ctx, "http://127.0.0.1:9/hook", now).await;

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", now).await.unwrap();

        assert_eq!(result.retried, 1);
        let stored = ctx.repos.webhook_job.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.attempt_count, 1);
        assert_eq!(stored.next_run_at, now.plus(time::Duration::seconds(30)));
        assert!(stored.last_error.is_some());
        let records = ctx.repos.delivery_record.list_by_job(job.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempt_index, 0);
        assert!(records[0].response_status.is_none());
    }

    #[tokio::test]
    async fn given_record_write_fails_when_run_once_should_leave_job_for_lease_expiry() {
        let mut ctx = in_memory_context();
        ctx.repos.delivery_record = Arc::new(DeliveryRecordRepository::new(Arc::new(
            DisabledDeliveryRecordStore,
        )));
        let now = Timestamp::now_utc();
        let (_, job) = seed(&ctx, "http://127.0.0.1:9/hook", now).await;

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", now).await.unwrap();

        assert_eq!(result.errored, 1);
        assert_eq!(result.retried, 0);
        let stored = ctx.repos.webhook_job.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.attempt_count, 0);
        assert_eq!(stored.next_run_at, now);
        let again = RunDeliveryCycleUseCase::run_once(&ctx, "w2", now).await.unwrap();
        assert_eq!(again.claimed, 0);
    }

    #[tokio::test]
    async fn given_rearmed_job_when_attempt_fails_should_log_next_attempt_index() {
        let ctx = in_memory_context();
        let now = Timestamp::now_utc();
        let (_, mut job) = seed(&ctx, "http://127.0.0.1:9/hook", now).await;
        job.status = JobStatus::Failed;
        job.attempt_count = 5;
        ctx.repos.webhook_job.update(&job).await.unwrap();
        job.rearm(now).unwrap();
        ctx.repos.webhook_job.update(&job).await.unwrap();

        let result = RunDeliveryCycleUseCase::run_once(&ctx, "w", now).await.unwrap();

        assert_eq!(result.retried, 1);
        let records = ctx.repos.delivery_record.list_by_job(job.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempt_index, 5);
        let stored = ctx.repos.webhook_job.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.attempt_count, 1);
        assert_eq!(stored.prior_attempts, 5);
    }
}
