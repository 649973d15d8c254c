use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Jira API usage counters, owned by the client that records them
#[derive(Debug, Default)]
pub struct JiraApiMetrics {
    pub total_requests: AtomicU64,
    pub read_failures: AtomicU64,
    pub write_failures: AtomicU64,
    pub read_retries: AtomicU64,
    pub poll_iterations: AtomicU64,
}

impl JiraApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_retry(&self) {
        self.read_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_iteration(&self) {
        self.poll_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> JiraApiStats {
        JiraApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            read_retries: self.read_retries.load(Ordering::Relaxed),
            poll_iterations: self.poll_iterations.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            requests = stats.total_requests,
            read_failures = stats.read_failures,
            write_failures = stats.write_failures,
            read_retries = stats.read_retries,
            poll_iterations = stats.poll_iterations,
            "Jira API metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraApiStats {
    pub total_requests: u64,
    pub read_failures: u64,
    pub write_failures: u64,
    pub read_retries: u64,
    pub poll_iterations: u64,
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = JiraApiMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_read_failure();
        metrics.record_read_retry();
        metrics.record_poll_iteration();

        let stats = metrics.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.read_failures, 1);
        assert_eq!(stats.write_failures, 0);
        assert_eq!(stats.read_retries, 1);
        assert_eq!(stats.poll_iterations, 1);
    }
}
