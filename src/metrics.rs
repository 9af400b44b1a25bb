use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing catalog mutations.
#[derive(Default)]
pub struct CatalogMetrics {
    products_created: AtomicU64,
    products_updated: AtomicU64,
    products_deleted: AtomicU64,
}

impl CatalogMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful create.
    pub fn record_created(&self) {
        self.products_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful update.
    pub fn record_updated(&self) {
        self.products_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delete.
    pub fn record_deleted(&self) {
        self.products_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters alongside the live record count.
    pub fn snapshot(&self, products_stored: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            products_created: self.products_created.load(Ordering::Relaxed),
            products_updated: self.products_updated.load(Ordering::Relaxed),
            products_deleted: self.products_deleted.load(Ordering::Relaxed),
            products_stored,
        }
    }
}

/// Immutable view of catalog counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of products created since startup.
    pub products_created: u64,
    /// Number of successful updates since startup.
    pub products_updated: u64,
    /// Number of successful deletes since startup.
    pub products_deleted: u64,
    /// Number of records currently held by the store.
    pub products_stored: u64,
}
