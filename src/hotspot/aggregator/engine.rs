//! Single-consumer aggregation over the window ring
//!
//! The aggregator is the only writer of ring state, so nothing here locks.
//! For every summary it computes `offset = window_id - first_window_id`:
//!
//! * `offset < 0` is stale and discarded
//! * `offset < windows_number` merges into the matching slot
//! * anything later triggers a rollover: the hot set is computed over the
//!   current ring, handlers run, the ring advances to the summary's window
//!   and the summary is merged there
//!
//! Over a rollover at offset `k` only the `2 * windows_number - k` oldest
//! slots contribute, and at `k >= 2 * windows_number` nothing does.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::hotspot::channel::WindowSummary;
use crate::hotspot::clock::WindowId;
use crate::hotspot::export::LatestNotification;
use crate::hotspot::traits::{Element, Entry, Notification, NotificationHandler, SensorResult};
use crate::telemetry::sensor_stats::SensorStatistics;

use super::ring::WindowRing;
use super::window::WindowCounter;

/// What happened to one processed summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Merged,
    /// Collector already merged into the target window
    Duplicate,
    /// Older than the oldest held window
    Stale,
    /// Ring advanced; the summary opened the new window
    RolledOver,
}

pub struct Aggregator<E: Element> {
    ring: WindowRing<E>,
    hot_threshold: u64,
    handlers: Vec<Box<dyn NotificationHandler<E>>>,
    /// Scratch counter reused by every hot-set computation
    scratch: WindowCounter<E>,
    /// Hot sets of the previous rollover
    baseline: Arc<Notification<E>>,
    latest: LatestNotification<E>,
    stats: Arc<SensorStatistics>,
}

impl<E: Element> Aggregator<E> {
    pub fn new(
        windows_number: usize,
        first_window_id: WindowId,
        hot_threshold: u64,
        handlers: Vec<Box<dyn NotificationHandler<E>>>,
        latest: LatestNotification<E>,
        stats: Arc<SensorStatistics>,
    ) -> SensorResult<Self> {
        Ok(Self {
            ring: WindowRing::new(windows_number, first_window_id)?,
            hot_threshold,
            handlers,
            scratch: WindowCounter::new(),
            baseline: Arc::new(Notification::empty()),
            latest,
            stats,
        })
    }

    /// Process one window summary
    pub fn process(&mut self, summary: WindowSummary<E>) -> ProcessOutcome {
        let offset = self.ring.offset_of(summary.window_id);
        let windows_number = self.ring.len();

        if offset < 0 {
            self.stats.record_stale();
            log::debug!(
                "discard out-of-date summary of window {}, oldest window is {}",
                summary.window_id,
                self.ring.first_window_id()
            );
            return ProcessOutcome::Stale;
        }

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset < windows_number {
            return self.merge(offset, &summary);
        }

        self.rollover(offset, summary.window_id);
        // the new window is now the oldest slot
        match self.merge(0, &summary) {
            ProcessOutcome::Merged => ProcessOutcome::RolledOver,
            other => other,
        }
    }

    fn merge(&mut self, offset: usize, summary: &WindowSummary<E>) -> ProcessOutcome {
        let window = self.ring.slot_mut(offset);
        if window.merge(summary.collector_id, &summary.entries, summary.total_count) {
            self.stats.record_merged();
            ProcessOutcome::Merged
        } else {
            self.stats.record_duplicate();
            log::warn!(
                "collector {} submits duplicated summary on window {}",
                summary.collector_id,
                summary.window_id
            );
            ProcessOutcome::Duplicate
        }
    }

    fn rollover(&mut self, offset: usize, window_id: WindowId) {
        let notification = Arc::new(self.compute_hot_set(offset));
        if notification.element_set_changed() {
            log::debug!(
                "hot elements set changed at window {}: {:?}",
                self.ring.first_window_id(),
                notification.hot_entries()
            );
        }

        self.dispatch(&notification);
        self.latest.publish(notification.clone());
        self.baseline = notification;
        self.stats.record_rollover();

        let interval = self.ring.len().min(offset);
        self.ring.advance(interval, window_id);
    }

    fn compute_hot_set(&mut self, offset: usize) -> Notification<E> {
        let windows_number = self.ring.len();
        let mut total_count = 0u64;

        let hot_entries: HashSet<Entry<E>> = if offset >= windows_number.saturating_mul(2) {
            HashSet::new()
        } else {
            let span = 2 * windows_number - offset;
            self.scratch.clear();
            for window in self.ring.oldest(span) {
                total_count = total_count.saturating_add(window.total_count());
                self.scratch.merge_all(window.counter());
            }
            self.scratch.filter_at_least(self.hot_threshold)
        };

        let hot_elements: HashSet<E> = hot_entries
            .iter()
            .map(|entry| entry.element().clone())
            .collect();
        let element_set_changed = hot_elements != *self.baseline.hot_elements();
        let entry_set_changed = hot_entries != *self.baseline.hot_entries();

        Notification::new(
            element_set_changed,
            hot_elements,
            entry_set_changed,
            hot_entries,
            total_count,
        )
    }

    /// Invoke every handler in registration order
    ///
    /// A panicking handler is logged and skipped; the remaining handlers still
    /// receive the notification.
    fn dispatch(&mut self, notification: &Notification<E>) {
        for (index, handler) in self.handlers.iter_mut().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                handler.handle_notification(notification)
            }));
            if result.is_err() {
                log::error!("notification handler {} panicked", index);
                self.stats.record_consumer_failure();
            }
        }
    }

    pub fn first_window_id(&self) -> WindowId {
        self.ring.first_window_id()
    }

    pub fn ring(&self) -> &WindowRing<E> {
        &self.ring
    }

    /// Hot sets of the most recent rollover
    pub fn baseline(&self) -> &Notification<E> {
        &self.baseline
    }
}

impl<E: Element> std::fmt::Debug for Aggregator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("windows_number", &self.ring.len())
            .field("first_window_id", &self.ring.first_window_id())
            .field("hot_threshold", &self.hot_threshold)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
