//! Per-worker collector
//!
//! A `Collector` is owned by exactly one producer and records hot candidates
//! for the current local window without any synchronization. An element is
//! promoted into tier-2 if it is seen twice before tier-1 evicts it; after
//! that it is never dropped for the rest of the window. Once tier-2 is full,
//! new promotions are lost, so tier-2 needs a sensible capacity.
//!
//! When the clock crosses into a new window the collector submits a
//! [`WindowSummary`] to the hand-off channel and starts over.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::hotspot::channel::{HandOffSender, WindowSummary};
use crate::hotspot::clock::{WindowClock, WindowId};
use crate::hotspot::config::L2Strategy;
use crate::hotspot::tier::{L2Counter, RecencyBuffer};
use crate::hotspot::traits::{Element, Entry, SensorResult};
use crate::telemetry::sensor_stats::SensorStatistics;

static COLLECTOR_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Process-wide collector identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectorId(u64);

impl CollectorId {
    /// Allocate the next id in the process-wide sequence
    pub fn next() -> Self {
        Self(COLLECTOR_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CollectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to create collectors for one sensor
pub struct CollectorFactory<E: Element> {
    sender: HandOffSender<E>,
    clock: Arc<dyn WindowClock>,
    stats: Arc<SensorStatistics>,
    l1_capacity: usize,
    l2_capacity: usize,
    l2_strategy: L2Strategy,
}

impl<E: Element> CollectorFactory<E> {
    pub(crate) fn new(
        sender: HandOffSender<E>,
        clock: Arc<dyn WindowClock>,
        stats: Arc<SensorStatistics>,
        l1_capacity: usize,
        l2_capacity: usize,
        l2_strategy: L2Strategy,
    ) -> Self {
        Self {
            sender,
            clock,
            stats,
            l1_capacity,
            l2_capacity,
            l2_strategy,
        }
    }

    pub fn create(&self) -> SensorResult<Collector<E>> {
        Collector::new(
            self.sender.clone(),
            self.clock.clone(),
            self.stats.clone(),
            RecencyBuffer::new(self.l1_capacity)?,
            self.l2_strategy.create(self.l2_capacity)?,
        )
    }

    pub(crate) fn sender(&self) -> &HandOffSender<E> {
        &self.sender
    }

    pub(crate) fn clock(&self) -> &Arc<dyn WindowClock> {
        &self.clock
    }
}

impl<E: Element> fmt::Debug for CollectorFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorFactory")
            .field("l1_capacity", &self.l1_capacity)
            .field("l2_capacity", &self.l2_capacity)
            .field("l2_strategy", &self.l2_strategy)
            .finish()
    }
}

/// Local promotion state for one producer
pub struct Collector<E: Element> {
    id: CollectorId,
    window_id: WindowId,
    clock: Arc<dyn WindowClock>,
    sender: HandOffSender<E>,
    stats: Arc<SensorStatistics>,
    l1: RecencyBuffer<E>,
    l2: Box<dyn L2Counter<E>>,
    /// Accesses in the current window
    total_count: u64,
}

impl<E: Element> Collector<E> {
    pub(crate) fn new(
        sender: HandOffSender<E>,
        clock: Arc<dyn WindowClock>,
        stats: Arc<SensorStatistics>,
        l1: RecencyBuffer<E>,
        l2: Box<dyn L2Counter<E>>,
    ) -> SensorResult<Self> {
        let window_id = clock.current_window_id();
        Ok(Self {
            id: CollectorId::next(),
            window_id,
            clock,
            sender,
            stats,
            l1,
            l2,
            total_count: 0,
        })
    }

    /// Record one access of `element`
    pub fn access(&mut self, element: E) {
        self.promote(element);
        self.total_count += 1;
        self.flush_if_elapsed();
    }

    /// Submit the current window if the clock has moved past it
    ///
    /// Returns true if a window was flushed. Idle producers can call this to
    /// hand over their last window without recording an access.
    pub fn flush_if_elapsed(&mut self) -> bool {
        let now = self.clock.current_window_id();
        if !now.after(self.window_id) {
            return false;
        }

        let summary = self.take_window();
        self.sender.submit(summary);
        self.window_id = now;
        true
    }

    /// Close the collector, returning its current window unless it is empty
    ///
    /// The window need not have elapsed. Nothing is submitted; the caller
    /// decides when the summary is handed off.
    pub(crate) fn into_summary(mut self) -> Option<WindowSummary<E>> {
        if self.total_count == 0 {
            return None;
        }
        Some(self.take_window())
    }

    fn take_window(&mut self) -> WindowSummary<E> {
        let summary = WindowSummary {
            collector_id: self.id,
            window_id: self.window_id,
            entries: self.l2.entries(),
            total_count: self.total_count,
        };
        self.l1.clear();
        self.l2.clear();
        self.total_count = 0;
        summary
    }

    fn promote(&mut self, element: E) {
        if self.l2.increment_if_present(&element) {
            return;
        }
        if let Some(twice) = self.l1.put(element)
            && !self.l2.add_if_absent_and_not_full(twice.clone())
        {
            self.stats.record_l2_overflow();
            log::debug!(
                "collector {} discard element {:?} because of overflow",
                self.id,
                twice
            );
        }
    }

    pub fn id(&self) -> CollectorId {
        self.id
    }

    /// Local window currently being recorded
    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Tier-2 entries of the current window
    pub fn pending_entries(&self) -> Vec<Entry<E>> {
        self.l2.entries()
    }
}

impl<E: Element> fmt::Debug for Collector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("id", &self.id)
            .field("window_id", &self.window_id)
            .field("l1_len", &self.l1.len())
            .field("l2_len", &self.l2.len())
            .field("total_count", &self.total_count)
            .finish()
    }
}
