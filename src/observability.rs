//! Process-wide logging and metrics setup.

use crate::config::Observability;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process. `RUST_LOG` overrides the `info` default.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_tracing(settings: &Observability) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let _ = match settings.log_format.as_str() {
        "pretty" => builder.pretty().try_init(),
        _ => builder.json().try_init(),
    };
}

/// Install the Prometheus recorder when metrics are enabled.
///
/// Returns `None` when disabled or when a recorder is already installed.
pub fn init_metrics(settings: &Observability) -> Option<PrometheusHandle> {
    if !settings.enable_metrics {
        return None;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "metrics recorder not installed");
            None
        }
    }
}
