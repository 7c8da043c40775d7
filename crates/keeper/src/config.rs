//! Runtime knobs for the keeper.

use std::time::Duration;

use pet::tuning::{DEFAULT_NAME, TICK_MIN_INTERVAL};

/// Default deadline for a single metrics read.
pub const DEFAULT_METRICS_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration for a [`crate::Keeper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperConfig {
    /// How often the background ticker fires.
    pub tick_period: Duration,
    /// Deadline for one metrics read; exceeding it is a `Timeout` failure.
    pub metrics_timeout: Duration,
    /// Name given to the pet (kept across resets).
    pub name: String,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            tick_period: TICK_MIN_INTERVAL,
            metrics_timeout: DEFAULT_METRICS_TIMEOUT,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl KeeperConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Zero periods are bumped to one millisecond (tokio rejects a zero interval).
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period.max(Duration::from_millis(1));
        self
    }

    pub fn with_metrics_timeout(mut self, timeout: Duration) -> Self {
        self.metrics_timeout = timeout;
        self
    }
}
