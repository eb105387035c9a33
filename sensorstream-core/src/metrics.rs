//! Externally observable engine counters.
//!
//! Counters are plain atomics shared between the engine core and the sink
//! worker through an `Arc<EngineMetrics>`. [`EngineMetrics::snapshot`] gives a
//! serializable point-in-time copy for audit output.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct EngineMetrics {
    ingested: AtomicU64,
    dropped_late: AtomicU64,
    malformed: AtomicU64,
    unmatched_join: AtomicU64,
    sink_overflow: AtomicU64,
    windows_emitted: AtomicU64,
    events_released: AtomicU64,
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub ingested: u64,
    pub dropped_late: u64,
    pub malformed: u64,
    pub unmatched_join: u64,
    pub sink_overflow: u64,
    pub windows_emitted: u64,
    pub events_released: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingested(&self) {
        self.ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_late(&self) {
        self.dropped_late.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmatched_join(&self) {
        self.unmatched_join.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_overflow(&self) {
        self.sink_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_windows_emitted(&self, n: u64) {
        self.windows_emitted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_events_released(&self, n: u64) {
        self.events_released.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dropped_late(&self) -> u64 {
        self.dropped_late.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn unmatched_join(&self) -> u64 {
        self.unmatched_join.load(Ordering::Relaxed)
    }

    pub fn sink_overflow(&self) -> u64 {
        self.sink_overflow.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ingested: self.ingested.load(Ordering::Relaxed),
            dropped_late: self.dropped_late.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unmatched_join: self.unmatched_join.load(Ordering::Relaxed),
            sink_overflow: self.sink_overflow.load(Ordering::Relaxed),
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            events_released: self.events_released.load(Ordering::Relaxed),
        }
    }
}
