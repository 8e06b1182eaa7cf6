use crate::domain::entities::delivery_record::AttemptResponse;
use crate::domain::entities::webhook_job::{JobStatus, WebhookJob};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::domain::workflows::retry_policy::{FailureDisposition, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Only pending jobs can be delivered.
    NotPending,
}

/// Effect of an attempt on the queue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTransition {
    /// Delivered: delete the job and reset the subscription counter.
    Remove,
    /// Retryable failure: persist the updated job.
    Reschedule { next_run_at: Timestamp },
    /// Retry budget spent: persist as failed and bump the subscription counter.
    Exhaust,
}

/// `pending -> (delivering) -> removed | pending | failed`.
pub struct DeliveryStateMachine;

impl DeliveryStateMachine {
    /// Apply the outcome of one attempt to `job` and return the queue effect.
    pub fn apply(
        job: &mut WebhookJob,
        response: &AttemptResponse,
        policy: &RetryPolicy,
        now: Timestamp,
    ) -> Result<JobTransition, TransitionError> {
        // Step 1: Guard against terminal jobs.
        if job.status != JobStatus::Pending {
            return Err(TransitionError::NotPending);
        }

        // Step 2: Successful attempts end the chain.
        if response.is_success() {
            job.last_error = None;
            job.updated_at = now;
            return Ok(JobTransition::Remove);
        }

        // Step 3: Count the failed attempt and keep its error.
        job.attempt_count = job.attempt_count.saturating_add(1);
        job.last_error = response.error_message();
        job.updated_at = now;

        // Step 4: Reschedule with backoff or fail permanently.
        match policy.after_failure(job.attempt_count) {
            FailureDisposition::Retry { delay } => {
                job.next_run_at = now.plus(delay);
                Ok(JobTransition::Reschedule {
                    next_run_at: job.next_run_at,
                })
            }
            FailureDisposition::Exhausted => {
                job.status = JobStatus::Failed;
                Ok(JobTransition::Exhaust)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ids::SubscriptionId;
    use serde_json::json;
    use time::Duration;

    fn job(now: Timestamp) -> WebhookJob {
        WebhookJob::new_pending(SubscriptionId::new(), "task.created", json!({}), now)
    }

    fn server_error() -> AttemptResponse {
        AttemptResponse::Received {
            status: 500,
            body: "boom".to_string(),
        }
    }

    #[test]
    fn given_2xx_when_apply_should_remove_without_counting_attempt() {
        let now = Timestamp::now_utc();
        let mut job = job(now);
        let ok = AttemptResponse::Received {
            status: 200,
            body: String::new(),
        };

        let transition =
            DeliveryStateMachine::apply(&mut job, &ok, &RetryPolicy::default(), now).unwrap();

        assert_eq!(transition, JobTransition::Remove);
        assert_eq!(job.attempt_count, 0);
    }

    #[test]
    fn given_first_failure_when_apply_should_reschedule_thirty_seconds_out() {
        let now = Timestamp::now_utc();
        let mut job = job(now);

        let transition =
            DeliveryStateMachine::apply(&mut job, &server_error(), &RetryPolicy::default(), now)
                .unwrap();

        assert_eq!(
            transition,
            JobTransition::Reschedule {
                next_run_at: now.plus(Duration::seconds(30))
            }
        );
        assert_eq!(job.attempt_count, 1);
        assert_eq!(job.last_error.as_deref(), Some("http_status_500"));
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn given_repeated_failures_when_apply_should_push_next_run_strictly_later() {
        let policy = RetryPolicy::default();
        let start = Timestamp::now_utc();
        let mut job = job(start);
        let mut now = start;
        let mut delays = Vec::new();

        for _ in 0..4 {
            let transition =
                DeliveryStateMachine::apply(&mut job, &server_error(), &policy, now).unwrap();
            let JobTransition::Reschedule { next_run_at } = transition else {
                panic!("expected reschedule");
            };
            delays.push((next_run_at.as_inner() - now.as_inner()).whole_seconds());
            assert!(next_run_at > now);
            now = next_run_at;
        }

        assert_eq!(delays, vec![30, 120, 480, 1920]);
    }

    #[test]
    fn given_last_budgeted_failure_when_apply_should_exhaust() {
        let now = Timestamp::now_utc();
        let mut job = job(now);
        job.attempt_count = 4;
        let timeout = AttemptResponse::TransportError("timed out".to_string());

        let transition =
            DeliveryStateMachine::apply(&mut job, &timeout, &RetryPolicy::default(), now).unwrap();

        assert_eq!(transition, JobTransition::Exhaust);
        assert_eq!(job.attempt_count, 5);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn given_4xx_when_apply_should_retry_like_5xx() {
        let now = Timestamp::now_utc();
        let mut job = job(now);
        let bad_request = AttemptResponse::Received {
            status: 400,
            body: String::new(),
        };

        let transition =
            DeliveryStateMachine::apply(&mut job, &bad_request, &RetryPolicy::default(), now)
                .unwrap();

        assert!(matches!(transition, JobTransition::Reschedule { .. }));
    }

    #[test]
    fn given_failed_job_when_apply_should_be_forbidden() {
        let now = Timestamp::now_utc();
        let mut job = job(now);
        job.status = JobStatus::Failed;

        let result =
            DeliveryStateMachine::apply(&mut job, &server_error(), &RetryPolicy::default(), now);

        assert_eq!(result, Err(TransitionError::NotPending));
    }
}
