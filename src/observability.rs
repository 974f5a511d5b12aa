use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Delivery workflow counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub transitions_committed: AtomicU64,
    pub transitions_rejected: AtomicU64,
    pub storage_failures: AtomicU64,
    pub bulk_batches: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_committed(&self) {
        self.transitions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_failure(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bulk_batch(&self) {
        self.bulk_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            transitions_committed: self.transitions_committed.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            bulk_batches: self.bulk_batches.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            committed = stats.transitions_committed,
            rejected = stats.transitions_rejected,
            storage_failures = stats.storage_failures,
            bulk_batches = stats.bulk_batches,
            "Delivery workflow metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStats {
    pub transitions_committed: u64,
    pub transitions_rejected: u64,
    pub storage_failures: u64,
    pub bulk_batches: u64,
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

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            success,
            "Operation completed"
        );
    }
}
