//! Execution metrics for the sheetrun runtime.
//!
//! Lock-free atomic counters recorded from concurrent request tasks. Use
//! [`MetricsSnapshot`] for a serializable view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Shared execution counters collected by [`super::ExecutionService`].
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    /// Validated requests that reached the orchestrator.
    pub total_executions: AtomicU64,
    /// Executions that returned an artifact.
    pub successful_executions: AtomicU64,
    /// Executions that returned a failure payload.
    pub failed_executions: AtomicU64,
    /// Requests rejected as client errors before execution.
    pub rejected_requests: AtomicU64,
    /// Failures where the script finished without writing its artifact.
    pub missing_artifacts: AtomicU64,
    /// Total artifact bytes returned.
    pub bytes_produced: AtomicU64,
}

/// A point-in-time copy of [`ExecutionMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub rejected_requests: u64,
    pub missing_artifacts: u64,
    pub bytes_produced: u64,
}

impl ExecutionMetrics {
    /// Creates zeroed metrics wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records one validated request.
    pub fn record_attempt(&self) {
        self.total_executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an artifact of `bytes` returned to the caller.
    pub fn record_success(&self, bytes: u64) {
        self.successful_executions.fetch_add(1, Ordering::Relaxed);
        self.bytes_produced.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a failure payload.
    pub fn record_failure(&self) {
        self.failed_executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a missing-artifact failure; also counts as a failure.
    pub fn record_missing_artifact(&self) {
        self.missing_artifacts.fetch_add(1, Ordering::Relaxed);
        self.record_failure();
    }

    /// Records a request rejected before execution.
    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_executions: self.total_executions.load(Ordering::Relaxed),
            successful_executions: self.successful_executions.load(Ordering::Relaxed),
            failed_executions: self.failed_executions.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            missing_artifacts: self.missing_artifacts.load(Ordering::Relaxed),
            bytes_produced: self.bytes_produced.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        assert_eq!(ExecutionMetrics::default().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn missing_artifact_counts_as_failure() {
        let m = ExecutionMetrics::default();
        m.record_missing_artifact();
        let s = m.snapshot();
        assert_eq!(s.missing_artifacts, 1);
        assert_eq!(s.failed_executions, 1);
    }

    #[test]
    fn success_accumulates_bytes() {
        let m = ExecutionMetrics::default();
        m.record_success(100);
        m.record_success(20);
        let s = m.snapshot();
        assert_eq!(s.successful_executions, 2);
        assert_eq!(s.bytes_produced, 120);
    }

    #[test]
    fn snapshot_serializes_field_names() {
        let m = ExecutionMetrics::default();
        m.record_rejected();
        let json = serde_json::to_value(m.snapshot()).expect("serialize");
        assert_eq!(json["rejected_requests"], 1);
        assert_eq!(json["total_executions"], 0);
    }
}
