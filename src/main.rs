use std::sync::Arc;

use tracing::{error, info, warn};
use webhook_relay::application::context::AppContext;
use webhook_relay::application::usecases::delivery_loop::DeliveryLoopUseCase;
use webhook_relay::config;
use webhook_relay::infrastructure::db::postgres::PostgresDatabase;
use webhook_relay::infrastructure::db::repositories::Repositories;
use webhook_relay::interface::http;
use webhook_relay::interface::http::state::AppState;
use webhook_relay::observability;

#[tokio::main]
async fn main() {
    // Step 1: Load configuration.
    let settings = config::load().expect("load config");

    // Step 2: Initialize logging and metrics.
    observability::init_tracing(&settings.observability);
    let metrics = observability::init_metrics(&settings.observability);

    // Step 3: Connect to the database and apply migrations.
    let repos = if settings.db.url.trim().is_empty() {
        warn!("db.url is empty, using in-memory stores");
        Repositories::in_memory()
    } else {
        let db = Arc::new(
            PostgresDatabase::connect(&settings.db.url, settings.db.max_connections)
                .await
                .expect("connect database"),
        );
        db.migrate().await.expect("apply migrations");
        Repositories::postgres(db)
    };

    // Step 4: Assemble shared application context and HTTP state.
    let ctx = Arc::new(AppContext::new(repos, settings.webhook_delivery.clone()));
    let worker_id = format!("{}-{}", settings.observability.service_name, uuid::Uuid::new_v4());
    let state = AppState::new(ctx.clone(), worker_id.clone()).with_metrics(metrics);

    // Step 5: Start the delivery loop when enabled.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let delivery_loop = if settings.webhook_delivery.enabled {
        Some(DeliveryLoopUseCase::spawn(ctx, worker_id, shutdown_rx))
    } else {
        info!("webhook delivery loop disabled, use POST /internal/webhooks/run");
        None
    };

    // Step 6: Bind and serve until Ctrl-C.
    let app = http::app(state);
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("bind server");
    info!(addr = %bind_addr, "http server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await;
    if let Err(err) = served {
        error!(error = %err, "http server failed");
    }

    // Step 7: Stop the delivery loop.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = delivery_loop {
        let _ = handle.await;
    }
    info!("shutdown complete");
}
