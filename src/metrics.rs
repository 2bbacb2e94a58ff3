//! Lightweight global metrics for MalhDB.
//!
//! Process-wide atomic counters:
//! - page I/O (reads / writes)
//! - linear hashing (splits, tuples inserted)
//! - overflow pages (grown at end of file / reused from free list / released)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Page I/O -----
static PAGES_READ: AtomicU64 = AtomicU64::new(0);
static PAGES_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Linear hashing -----
static SPLITS: AtomicU64 = AtomicU64::new(0);
static TUPLES_INSERTED: AtomicU64 = AtomicU64::new(0);

// ----- Overflow pages -----
static OVF_PAGES_GROWN: AtomicU64 = AtomicU64::new(0);
static OVF_PAGES_REUSED: AtomicU64 = AtomicU64::new(0);
static OVF_PAGES_RELEASED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub pages_read: u64,
    pub pages_written: u64,

    pub splits: u64,
    pub tuples_inserted: u64,

    pub overflow_pages_grown: u64,
    pub overflow_pages_reused: u64,
    pub overflow_pages_released: u64,
}

impl MetricsSnapshot {
    /// Share of overflow acquisitions served from the free list.
    pub fn overflow_reuse_ratio(&self) -> f64 {
        let total = self.overflow_pages_grown + self.overflow_pages_reused;
        if total == 0 {
            0.0
        } else {
            self.overflow_pages_reused as f64 / total as f64
        }
    }
}

// ----- Recorders (Page I/O) -----
pub fn record_page_read() {
    PAGES_READ.fetch_add(1, Ordering::Relaxed);
}
pub fn record_page_write() {
    PAGES_WRITTEN.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Linear hashing) -----
pub fn record_split() {
    SPLITS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_tuple_inserted() {
    TUPLES_INSERTED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Overflow) -----
pub fn record_overflow_grown() {
    OVF_PAGES_GROWN.fetch_add(1, Ordering::Relaxed);
}
pub fn record_overflow_reused() {
    OVF_PAGES_REUSED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_overflow_released() {
    OVF_PAGES_RELEASED.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot -----
pub fn metrics_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        pages_read: PAGES_READ.load(Ordering::Relaxed),
        pages_written: PAGES_WRITTEN.load(Ordering::Relaxed),

        splits: SPLITS.load(Ordering::Relaxed),
        tuples_inserted: TUPLES_INSERTED.load(Ordering::Relaxed),

        overflow_pages_grown: OVF_PAGES_GROWN.load(Ordering::Relaxed),
        overflow_pages_reused: OVF_PAGES_REUSED.load(Ordering::Relaxed),
        overflow_pages_released: OVF_PAGES_RELEASED.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let a = metrics_snapshot();
        record_split();
        record_overflow_reused();
        let b = metrics_snapshot();
        assert!(b.splits > a.splits);
        assert!(b.overflow_pages_reused > a.overflow_pages_reused);
        assert!(b.overflow_reuse_ratio() > 0.0 && b.overflow_reuse_ratio() <= 1.0);
        assert_eq!(MetricsSnapshot::default().overflow_reuse_ratio(), 0.0);
    }
}
