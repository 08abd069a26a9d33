use crate::config::Config;
use routing_common::adapters::tracker::Tracker;
use routing_common::retry::RetryPolicy;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Everything a handler needs, wired once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub tracker: Arc<dyn Tracker>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn retry_policy(config: &Config) -> RetryPolicy {
        RetryPolicy {
            max_attempts: config.tracker_max_attempts,
            base_delay: Duration::from_millis(config.tracker_base_delay_ms),
            multiplier: 2,
            max_jitter: Duration::from_millis(250),
        }
    }
}
