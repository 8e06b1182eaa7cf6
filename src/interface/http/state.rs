use std::sync::Arc;

use crate::application::context::AppContext;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    /// Lease owner used when a cycle is run through the HTTP trigger.
    pub worker_id: Arc<str>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(ctx: Arc<AppContext>, worker_id: impl Into<Arc<str>>) -> Self {
        Self {
            ctx,
            worker_id: worker_id.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<PrometheusHandle>) -> Self {
        self.metrics = metrics;
        self
    }
}
