//! Explain metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one explainer
#[derive(Debug, Default)]
pub struct ExplainMetrics {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    rejected_permanent: AtomicU64,
    rejected_by_version: AtomicU64,
    rejected_unknown: AtomicU64,
    decode_failures: AtomicU64,
    driver_failures: AtomicU64,
}

impl ExplainMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_attempted(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_permanent(&self) {
        self.rejected_permanent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_by_version(&self) {
        self.rejected_by_version.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_unknown(&self) {
        self.rejected_unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_driver_failures(&self) {
        self.driver_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rejected_permanent: self.rejected_permanent.load(Ordering::Relaxed),
            rejected_by_version: self.rejected_by_version.load(Ordering::Relaxed),
            rejected_unknown: self.rejected_unknown.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            driver_failures: self.driver_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub rejected_permanent: u64,
    pub rejected_by_version: u64,
    pub rejected_unknown: u64,
    pub decode_failures: u64,
    pub driver_failures: u64,
}

impl MetricsSnapshot {
    /// Total policy rejections
    pub fn rejected(&self) -> u64 {
        self.rejected_permanent + self.rejected_by_version + self.rejected_unknown
    }
}
