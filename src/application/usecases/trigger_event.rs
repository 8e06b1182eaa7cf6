// Use case: trigger_event.

use crate::application::context::AppContext;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::value_objects::ids::WorkspaceId;
use crate::domain::value_objects::timestamps::Timestamp;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Fans a domain event out to every matching webhook subscription.
pub struct TriggerEventUseCase;

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEventCommand {
    pub workspace_id: WorkspaceId,
    pub event_name: String,
    pub payload: serde_json::Value,
}

#[derive(Debug)]
pub enum TriggerEventError {
    Storage(String),
}

impl TriggerEventUseCase {
    /// Enqueue one job per active subscription that matches the event.
    ///
    /// Returns the number of jobs enqueued. Storage failures are returned to
    /// the caller; use [`TriggerEventUseCase::execute`] or
    /// [`TriggerEventUseCase::spawn`] from mutation paths, which never fail.
    pub async fn try_execute(
        ctx: &AppContext,
        cmd: &TriggerEventCommand,
        now: Timestamp,
    ) -> Result<usize, TriggerEventError> {
        // Step 1: Load active subscriptions in the workspace.
        let subscriptions = ctx
            .repos
            .subscription
            .list_active_for_workspace(&cmd.workspace_id)
            .await
            .map_err(|e| TriggerEventError::Storage(format!("{e:?}")))?;

        // Step 2: Keep the ones subscribed to this event.
        let jobs: Vec<WebhookJob> = subscriptions
            .iter()
            .filter(|sub| sub.matches_event(&cmd.event_name))
            .map(|sub| WebhookJob::new_pending(sub.id, &cmd.event_name, cmd.payload.clone(), now))
            .collect();
        if jobs.is_empty() {
            debug!(
                workspace_id = cmd.workspace_id.as_str(),
                event = %cmd.event_name,
                "no webhook subscriptions match event"
            );
            return Ok(0);
        }

        // Step 3: Enqueue all jobs in one transaction.
        let stored = ctx
            .repos
            .webhook_job
            .insert_many(&jobs)
            .await
            .map_err(|e| TriggerEventError::Storage(format!("{e:?}")))?;

        counter!("webhook_jobs_enqueued_total").increment(stored.len() as u64);
        info!(
            workspace_id = cmd.workspace_id.as_str(),
            event = %cmd.event_name,
            jobs = stored.len(),
            "webhook jobs enqueued"
        );
        Ok(stored.len())
    }

    /// Enqueue matching jobs, logging and swallowing any storage failure.
    pub async fn execute(ctx: &AppContext, cmd: TriggerEventCommand) -> usize {
        match Self::try_execute(ctx, &cmd, Timestamp::now_utc()).await {
            Ok(count) => count,
            Err(err) => {
                error!(
                    workspace_id = cmd.workspace_id.as_str(),
                    event = %cmd.event_name,
                    error = ?err,
                    "failed to enqueue webhook jobs"
                );
                0
            }
        }
    }

    /// Fire-and-forget variant for request handlers: runs on a detached task.
    pub fn spawn(ctx: Arc<AppContext>, cmd: TriggerEventCommand) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let _ = Self::execute(&ctx, cmd).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::test_support::{in_memory_context, unavailable_context};
    use crate::domain::entities::subscription::{AdapterType, Subscription};
    use crate::domain::entities::webhook_job::JobStatus;
    use serde_json::json;

    fn command(workspace: &str, event: &str) -> TriggerEventCommand {
        TriggerEventCommand {
            workspace_id: WorkspaceId::from(workspace),
            event_name: event.to_string(),
            payload: json!({"id": "t1", "title": "Write docs"}),
        }
    }

    async fn subscribe(ctx: &AppContext, workspace: &str, events: &[&str]) -> Subscription {
        let sub = Subscription::new(
            WorkspaceId::from(workspace),
            "https://example.com/hook",
            AdapterType::Generic,
            None,
            events.iter().map(|e| e.to_string()).collect(),
        );
        ctx.repos.subscription.insert(&sub).await.unwrap()
    }

    #[tokio::test]
    async fn given_wildcard_and_exact_subscriptions_when_trigger_should_enqueue_one_job_each() {
        let ctx = in_memory_context();
        subscribe(&ctx, "w1", &["*"]).await;
        subscribe(&ctx, "w1", &["task.created"]).await;
        subscribe(&ctx, "w1", &["member.joined"]).await;
        subscribe(&ctx, "w2", &["*"]).await;

        let count = TriggerEventUseCase::try_execute(
            &ctx,
            &command("w1", "task.created"),
            Timestamp::now_utc(),
        )
        .await
        .unwrap();

        assert_eq!(count, 2);
        let stats = ctx.repos.webhook_job.stats().await.unwrap();
        assert_eq!(stats.pending, 2);
    }

    #[tokio::test]
    async fn given_new_job_when_enqueued_should_be_immediately_due_with_no_attempts() {
        let ctx = in_memory_context();
        subscribe(&ctx, "w1", &["task.*"]).await;
        let now = Timestamp::now_utc();

        TriggerEventUseCase::try_execute(&ctx, &command("w1", "task.created"), now)
            .await
            .unwrap();

        let claimed = ctx
            .repos
            .webhook_job
            .claim_due(now, 10, "test", now.plus(time::Duration::minutes(5)))
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].status, JobStatus::Pending);
        assert_eq!(claimed[0].attempt_count, 0);
        assert_eq!(claimed[0].payload, command("w1", "x").payload);
    }

    #[tokio::test]
    async fn given_inactive_subscription_when_trigger_should_not_enqueue() {
        let ctx = in_memory_context();
        let mut sub = subscribe(&ctx, "w1", &["*"]).await;
        sub.is_active = false;
        ctx.repos.subscription.update(&sub).await.unwrap();

        let count = TriggerEventUseCase::execute(&ctx, command("w1", "task.created")).await;

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn given_storage_unavailable_when_execute_should_swallow_error() {
        let ctx = unavailable_context();

        let count = TriggerEventUseCase::execute(&ctx, command("w1", "task.created")).await;

        assert_eq!(count, 0);
        assert!(
            TriggerEventUseCase::try_execute(&ctx, &command("w1", "x"), Timestamp::now_utc())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn given_spawned_trigger_when_joined_should_have_enqueued_jobs() {
        let ctx = Arc::new(in_memory_context());
        subscribe(&ctx, "w1", &["*"]).await;

        TriggerEventUseCase::spawn(ctx.clone(), command("w1", "file.uploaded"))
            .await
            .unwrap();

        assert_eq!(ctx.repos.webhook_job.stats().await.unwrap().pending, 1);
    }
}
