//! Per-instance request counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording request outcomes
#[derive(Debug, Default)]
pub struct Metrics {
    served: AtomicU64,
    not_found: AtomicU64,
    rejected: AtomicU64,
    cascaded: AtomicU64,
    failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "served", "Metric incremented");
    }

    pub fn not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "not_found", "Metric incremented");
    }

    /// Token turned away by DoS protection
    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "rejected", "Metric incremented");
    }

    pub fn cascaded(&self) {
        self.cascaded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "cascaded", "Metric incremented");
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            served: self.served.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            cascaded: self.cascaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub served: u64,
    pub not_found: u64,
    pub rejected: u64,
    pub cascaded: u64,
    pub failed: u64,
}
