//! Orchestrator settings.

use std::time::Duration;

/// Default grace period before the first status check. Also the initial poll delay.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default upper bound on how long a job may take to reach a terminal state.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default page size requested from the query results endpoint.
pub const DEFAULT_MAX_RECORDS_PER_PAGE: usize = 50_000;

/// Polling and paging settings shared by the orchestrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// `None` lets the service pick the page size.
    pub max_records_per_page: Option<usize>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_records_per_page: Some(DEFAULT_MAX_RECORDS_PER_PAGE),
        }
    }
}

impl BulkConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the requested page size. Zero means "service default".
    pub fn with_max_records_per_page(mut self, max: usize) -> Self {
        self.max_records_per_page = (max > 0).then_some(max);
        self
    }
}
