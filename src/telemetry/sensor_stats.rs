//! Sensor diagnostic counters with atomic operations for thread safety
//!
//! Producers and the aggregator update these counters without locks. They
//! are diagnostics only and never influence detection.

use crossbeam_utils::CachePadded;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe sensor statistics
#[derive(Debug, Default)]
pub struct SensorStatistics {
    /// Window summaries accepted by the hand-off channel
    submitted: CachePadded<AtomicU64>,
    /// Window summaries dropped because the channel was full or closed
    dropped: CachePadded<AtomicU64>,
    /// Summaries merged into a global window
    merged: CachePadded<AtomicU64>,
    /// Summaries rejected as duplicate collector submissions
    duplicate_rejected: CachePadded<AtomicU64>,
    /// Summaries older than the oldest ring window
    stale_discarded: CachePadded<AtomicU64>,
    rollovers: CachePadded<AtomicU64>,
    /// Messages whose processing panicked on the consumer thread
    consumer_failures: CachePadded<AtomicU64>,
    /// Promotions lost because a tier-2 counter was full
    l2_overflow: CachePadded<AtomicU64>,
}

/// Point-in-time copy of [`SensorStatistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStatsSnapshot {
    pub submitted: u64,
    pub dropped: u64,
    pub merged: u64,
    pub duplicate_rejected: u64,
    pub stale_discarded: u64,
    pub rollovers: u64,
    pub consumer_failures: u64,
    pub l2_overflow: u64,
}

impl SensorStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_merged(&self) {
        self.merged.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_duplicate(&self) {
        self.duplicate_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_rollover(&self) {
        self.rollovers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumer_failure(&self) {
        let total = self.consumer_failures.fetch_add(1, Ordering::Relaxed) + 1;
        log::warn!("consumer failure recorded (total: {})", total);
    }

    #[inline(always)]
    pub fn record_l2_overflow(&self) {
        self.l2_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SensorStatsSnapshot {
        SensorStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            merged: self.merged.load(Ordering::Relaxed),
            duplicate_rejected: self.duplicate_rejected.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            rollovers: self.rollovers.load(Ordering::Relaxed),
            consumer_failures: self.consumer_failures.load(Ordering::Relaxed),
            l2_overflow: self.l2_overflow.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.submitted,
            &self.dropped,
            &self.merged,
            &self.duplicate_rejected,
            &self.stale_discarded,
            &self.rollovers,
            &self.consumer_failures,
            &self.l2_overflow,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        log::info!("sensor statistics reset");
    }
}

impl SensorStatsSnapshot {
    /// Fraction of submissions that were dropped (0.0 to 1.0)
    pub fn drop_rate(&self) -> f64 {
        let attempted = self.submitted + self.dropped;
        if attempted == 0 {
            return 0.0;
        }
        self.dropped as f64 / attempted as f64
    }
}
