// Read-after-write consistency for an eventually-consistent remote.
//
// Two bounded loops: read-with-retry for a trustworthy "before" value, and
// wait-for-change to absorb propagation lag after a transition is submitted.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::client::StatusReader;
use super::types::UNKNOWN_STATUS;
use super::{IssueKey, JiraError};
use crate::observability::JiraApiMetrics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub read_attempts: u32,
    pub read_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            read_attempts: 3,
            read_delay_ms: 600,
            poll_interval_ms: 1200,
            poll_timeout_ms: 20_000,
        }
    }
}

impl PollConfig {
    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[derive(Debug)]
pub struct ConsistencyPoller<R> {
    reader: R,
    config: PollConfig,
    metrics: Arc<JiraApiMetrics>,
}

impl<R: StatusReader> ConsistencyPoller<R> {
    pub fn new(reader: R, config: PollConfig) -> Self {
        Self {
            reader,
            config,
            metrics: Arc::new(JiraApiMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<JiraApiMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Up to `read_attempts` reads with a fixed delay between them. Returns the
    /// first success or the last error.
    pub async fn read_with_retry(&self, key: &IssueKey) -> Result<String, JiraError> {
        let attempts = self.config.read_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.reader.read_status(key).await {
                Ok(status) => return Ok(status),
                Err(err) if attempt < attempts => {
                    warn!(
                        issue_key = %key,
                        attempt,
                        attempts,
                        transient = err.is_transient_read(),
                        error = %err,
                        "Status read failed, retrying"
                    );
                    self.metrics.record_read_retry();
                    attempt += 1;
                    sleep(self.config.read_delay()).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Read-with-retry that degrades to the `Unknown` sentinel. For cosmetic
    /// display only, never for control decisions.
    pub async fn read_best_effort(&self, key: &IssueKey) -> String {
        match self.read_with_retry(key).await {
            Ok(status) => status,
            Err(err) => {
                warn!(issue_key = %key, error = %err, "Best-effort status read failed");
                UNKNOWN_STATUS.to_string()
            }
        }
    }

    /// Poll until the status differs from `before` or the timeout elapses.
    ///
    /// Failed polls are skipped. On timeout one final read is made and its
    /// value returned (or `Unknown`), so a slow confirmation never fails the
    /// interaction and never blocks past the deadline plus that last read.
    pub async fn wait_for_change(&self, key: &IssueKey, before: &str) -> String {
        let deadline = Instant::now() + self.config.poll_timeout();
        let interval = self.config.poll_interval();

        while Instant::now() < deadline {
            self.metrics.record_poll_iteration();
            match self.reader.read_status(key).await {
                Ok(status) if status != before => {
                    debug!(issue_key = %key, before = %before, after = %status, "Status change observed");
                    return status;
                }
                Ok(_) => {}
                Err(err) => debug!(issue_key = %key, error = %err, "Poll read failed"),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(interval.min(remaining)).await;
        }

        warn!(
            issue_key = %key,
            before = %before,
            timeout_ms = self.config.poll_timeout_ms,
            "Status change not observed before timeout"
        );
        match self.reader.read_status(key).await {
            Ok(status) => status,
            Err(_) => UNKNOWN_STATUS.to_string(),
        }
    }
}
