use crate::domain::workflows::retry_policy::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Headroom added to the lease floor for the claim and bookkeeping queries.
const LEASE_SLACK_MS: u64 = 5_000;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: Server,
    pub db: Db,
    pub webhook_delivery: WebhookDelivery,
    pub observability: Observability,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Db {
    /// Postgres URL. An empty value runs against in-memory stores.
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub batch_size: u32,
    pub concurrency: usize,
    pub request_timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_factor: u64,
    pub lease_seconds: i64,
    pub response_snippet_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Observability {
    pub service_name: String,
    /// `json` or `pretty`.
    pub log_format: String,
    pub enable_metrics: bool,
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 60_000,
            batch_size: 10,
            concurrency: 4,
            request_timeout_ms: 10_000,
            max_attempts: 5,
            backoff_base_ms: 30_000,
            backoff_factor: 4,
            lease_seconds: 300,
            response_snippet_bytes: 2048,
        }
    }
}

impl WebhookDelivery {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay_ms: self.backoff_base_ms,
            factor: self.backoff_factor.max(1),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// How long a claimed job stays invisible to other workers.
    ///
    /// Never shorter than the time the whole batch may take: jobs wait for a
    /// free slot in waves of `concurrency`, each wave bounded by the request
    /// timeout.
    pub fn lease(&self) -> time::Duration {
        time::Duration::milliseconds(self.lease_ms().min(i64::MAX as u64) as i64)
    }

    /// Time after the claim during which a job may still start its request
    /// and finish before its lease runs out.
    pub fn start_window(&self) -> Duration {
        Duration::from_millis(self.lease_ms().saturating_sub(self.request_timeout_ms))
    }

    fn lease_ms(&self) -> u64 {
        let batch = u64::from(self.batch_size.max(1));
        let concurrency = self.concurrency.max(1) as u64;
        let waves = batch.div_ceil(concurrency);
        let floor = waves
            .saturating_mul(self.request_timeout_ms)
            .saturating_add(LEASE_SLACK_MS);
        let configured = (self.lease_seconds.max(0) as u64).saturating_mul(1000);
        configured.max(floor)
    }
}

/// Load settings from `config/default.toml`, `config/<env>.toml`, and env overrides.
pub fn load() -> Result<Settings, config::ConfigError> {
    let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    config::Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(config::Environment::with_prefix("WEBHOOK_RELAY").separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_delivery_settings_when_retry_policy_should_match_schedule() {
        let policy = WebhookDelivery::default().retry_policy();

        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn given_short_lease_when_lease_should_cover_every_wave_of_the_batch() {
        let settings = WebhookDelivery {
            lease_seconds: 1,
            request_timeout_ms: 10_000,
            batch_size: 10,
            concurrency: 4,
            ..WebhookDelivery::default()
        };

        // 3 waves of 10 s plus slack.
        assert_eq!(settings.lease(), time::Duration::seconds(35));
        assert_eq!(settings.start_window(), Duration::from_secs(25));
    }

    #[test]
    fn given_serial_batch_when_lease_should_cover_each_job_in_turn() {
        let settings = WebhookDelivery {
            lease_seconds: 1,
            request_timeout_ms: 2_000,
            batch_size: 3,
            concurrency: 1,
            ..WebhookDelivery::default()
        };

        assert_eq!(settings.lease(), time::Duration::seconds(11));
    }

    #[test]
    fn given_long_configured_lease_when_lease_should_keep_it() {
        let settings = WebhookDelivery::default();

        assert_eq!(settings.lease(), time::Duration::seconds(300));
    }

    #[test]
    fn given_repository_defaults_when_load_should_read_default_toml() {
        let settings = load().unwrap();

        assert_eq!(settings.webhook_delivery, WebhookDelivery::default());
        assert_eq!(settings.server.port, 8080);
    }
}
