//! Tracker configuration.

use std::time::Duration;

/// Job tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between the end of one poll cycle and the start of the next
    pub poll_interval: Duration,
    /// How long completed jobs stay visible before pruning
    pub completed_retention: Duration,
    /// How long failed jobs stay visible before pruning
    pub failed_retention: Duration,
    /// Consecutive failed polls for one job before a warning is logged
    pub failure_warn_threshold: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            completed_retention: Duration::from_secs(10),
            failed_retention: Duration::from_secs(30),
            failure_warn_threshold: 5,
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_millis(
                std::env::var("TRACKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.poll_interval.as_millis() as u64),
            ),
            completed_retention: Duration::from_secs(
                std::env::var("TRACKER_COMPLETED_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.completed_retention.as_secs()),
            ),
            failed_retention: Duration::from_secs(
                std::env::var("TRACKER_FAILED_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.failed_retention.as_secs()),
            ),
            failure_warn_threshold: std::env::var("TRACKER_FAILURE_WARN_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.failure_warn_threshold),
        }
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the retention windows.
    pub fn with_retention(mut self, completed: Duration, failed: Duration) -> Self {
        self.completed_retention = completed;
        self.failed_retention = failed;
        self
    }
}
