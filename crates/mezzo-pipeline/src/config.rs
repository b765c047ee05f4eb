//! Pipeline configuration.

use std::time::Duration;

/// Tunable parameters for the orchestration pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Public URL the worker posts completion callbacks to
    pub webhook_url: String,

    /// Maximum accepted clock skew on the callback timestamp header
    pub callback_max_skew: Duration,

    /// How long a job may stay in flight before the sweep times it out
    pub job_timeout: Duration,

    /// Interval between timeout sweeps
    pub sweep_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:8080/webhooks/transcoding".to_string(),
            callback_max_skew: Duration::from_secs(300),
            job_timeout: Duration::from_secs(1800),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            webhook_url: std::env::var("WEBHOOK_URL").unwrap_or(defaults.webhook_url),
            callback_max_skew: env_secs("CALLBACK_MAX_SKEW_SECS", defaults.callback_max_skew),
            job_timeout: env_secs("JOB_TIMEOUT_SECS", defaults.job_timeout),
            sweep_interval: env_secs("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
        }
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
