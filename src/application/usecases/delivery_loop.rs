// Use case: delivery_loop.

use crate::application::context::AppContext;
use crate::application::usecases::run_delivery_cycle::RunDeliveryCycleUseCase;
use crate::domain::value_objects::timestamps::Timestamp;
use std::sync::Arc;
use tracing::{error, info};

/// Runs delivery cycles at a fixed interval until shutdown.
pub struct DeliveryLoopUseCase;

impl DeliveryLoopUseCase {
    /// Run the loop on the current task. A failing cycle is logged and the
    /// loop keeps going; only the shutdown signal ends it.
    pub async fn run_loop(
        ctx: &AppContext,
        worker_id: &str,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let poll_interval = ctx.delivery.poll_interval();
        info!(
            worker_id,
            poll_interval_ms = ctx.delivery.poll_interval_ms,
            "webhook delivery loop started"
        );

        // Step 1: Loop until shutdown is triggered.
        loop {
            if *shutdown.borrow() {
                break;
            }

            // Step 2: Run a delivery pass.
            let now = Timestamp::now_utc();
            if let Err(err) = RunDeliveryCycleUseCase::run_once(ctx, worker_id, now).await {
                error!(worker_id, error = %err, "webhook delivery cycle failed");
            }

            // Step 3: Sleep until the next pass or shutdown.
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        // Step 4: Exit cleanly.
        info!(worker_id, "webhook delivery loop stopped");
    }

    /// Run the loop on its own task.
    pub fn spawn(
        ctx: Arc<AppContext>,
        worker_id: String,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { Self::run_loop(&ctx, &worker_id, shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::test_support::unavailable_context;

    #[tokio::test]
    async fn given_failing_storage_when_loop_runs_should_keep_running_until_shutdown() {
        let mut ctx = unavailable_context();
        ctx.delivery.poll_interval_ms = 5;
        let (tx, rx) = tokio::sync::watch::channel(false);
        let handle = DeliveryLoopUseCase::spawn(Arc::new(ctx), "w".to_string(), rx);

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
