use std::time::Duration;

use crate::config::Config;

/// Run-level settings. Component settings (AI retries, HTTP timeouts) live
/// with their clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total attempts for a run that keeps failing on a rate limit or timeout.
    pub max_run_attempts: u32,
    /// Delay before a failed run is enqueued again.
    pub retry_delay: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_run_attempts: config.retry.max_attempts,
            retry_delay: Duration::from_secs(config.retry.delay_secs),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_run_attempts: 3,
            retry_delay: Duration::from_secs(60),
        }
    }
}
