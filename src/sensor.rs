//! Public API for the hotspot sensor
//!
//! `HotspotSensor` wires the pipeline together: per-thread collectors feed a
//! bounded channel, a single consumer thread aggregates windows and notifies
//! handlers at every rollover. Handles are cheap to clone; the pipeline shuts
//! down when `shutdown` is called or the last handle is dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crate::hotspot::aggregator::Aggregator;
use crate::hotspot::aggregator::worker::spawn_consumer;
use crate::hotspot::channel::{WindowSummary, hand_off_channel};
use crate::hotspot::clock::{Watch, WindowClock, WindowId};
use crate::hotspot::collector::{Collector, CollectorFactory, CollectorId, CollectorRegistry};
use crate::hotspot::config::{L2Strategy, SensorConfig};
use crate::hotspot::export::LatestNotification;
use crate::hotspot::traits::{
    Element, Entry, Notification, NotificationHandler, SensorError, SensorResult,
};
use crate::telemetry::sensor_stats::{SensorStatistics, SensorStatsSnapshot};

/// Hot element detector
///
/// `E` is the tracked element type, typically a cache key.
pub struct HotspotSensor<E: Element> {
    inner: Arc<SensorInner<E>>,
}

struct SensorInner<E: Element> {
    config: SensorConfig,
    registry: CollectorRegistry<E>,
    latest: LatestNotification<E>,
    stats: Arc<SensorStatistics>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    consumer_thread: ThreadId,
    /// Ticker owned by this sensor; `None` when the clock was injected
    watch: Option<Arc<Watch>>,
    shut_down: AtomicBool,
}

impl<E: Element> Clone for HotspotSensor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> HotspotSensor<E> {
    pub fn builder() -> HotspotSensorBuilder<E> {
        HotspotSensorBuilder::new()
    }

    /// Record one access of `element` on the calling thread
    ///
    /// Never blocks and never fails; a summary that cannot be handed off is
    /// dropped and counted.
    pub fn increase(&self, element: E) {
        if self.inner.shut_down.load(Ordering::Relaxed) {
            return;
        }
        if let Err(e) = self.inner.registry.access(element) {
            log::warn!("hot detect, failed to record access: {}", e);
        }
    }

    /// Create a collector owned by the caller
    ///
    /// Workers that keep their own context can record through this handle
    /// and skip the registry lookup in `increase`.
    pub fn collector(&self) -> SensorResult<Collector<E>> {
        if self.inner.shut_down.load(Ordering::Relaxed) {
            return Err(SensorError::invalid_state("sensor is shut down"));
        }
        self.inner.registry.factory().create()
    }

    /// Submit a pre-aggregated window summary directly
    ///
    /// `entries` follow the collector convention: each count is one below
    /// the number of accesses. Returns false if the summary was dropped.
    pub fn submit(
        &self,
        collector_id: CollectorId,
        window_id: WindowId,
        entries: Vec<Entry<E>>,
        total_count: u64,
    ) -> bool {
        self.inner.registry.factory().sender().submit(WindowSummary {
            collector_id,
            window_id,
            entries,
            total_count,
        })
    }

    /// Flush every thread collector whose window has elapsed, along with
    /// the last windows of threads that have exited
    pub fn flush_elapsed(&self) -> usize {
        self.inner.registry.flush_elapsed()
    }

    /// Drop the calling thread's collector now instead of at thread exit
    ///
    /// Its pending window is submitted.
    pub fn release_current_thread(&self) -> Option<CollectorId> {
        self.inner.registry.release_current()
    }

    pub fn current_window_id(&self) -> WindowId {
        self.inner.registry.factory().clock().current_window_id()
    }

    /// Notification of the most recent rollover
    pub fn latest(&self) -> Option<Arc<Notification<E>>> {
        self.inner.latest.snapshot()
    }

    /// Shared handle to the latest snapshot, for management exporters
    pub fn latest_handle(&self) -> LatestNotification<E> {
        self.inner.latest.clone()
    }

    pub fn stats(&self) -> SensorStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> &SensorConfig {
        &self.inner.config
    }

    /// Summaries waiting for the consumer
    pub fn pending(&self) -> usize {
        self.inner.registry.factory().sender().len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Relaxed)
    }

    /// Stop the pipeline
    ///
    /// Summaries queued before this call are still processed. Must not be
    /// called from a notification handler.
    pub fn shutdown(&self) -> SensorResult<()> {
        self.inner.shutdown()
    }
}

impl<E: Element> SensorInner<E> {
    fn shutdown(&self) -> SensorResult<()> {
        if thread::current().id() == self.consumer_thread {
            return Err(SensorError::invalid_state(
                "shutdown called from the consumer thread",
            ));
        }
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let parked = self.registry.hand_over_retired();
        if parked > 0 {
            log::debug!("handed over {} windows of exited threads", parked);
        }
        if let Err(e) = self.registry.factory().sender().send_shutdown() {
            log::warn!("consumer already gone before shutdown: {}", e);
        }

        let handle = self
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let joined = match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| SensorError::worker_failure("failed to join consumer thread")),
            None => Ok(()),
        };

        if let Some(watch) = &self.watch {
            watch.stop();
        }
        log::info!("hotspot sensor shut down");
        joined
    }
}

impl<E: Element> Drop for SensorInner<E> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("hotspot sensor shutdown on drop failed: {}", e);
        }
    }
}

impl<E: Element> fmt::Debug for HotspotSensor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotSensor")
            .field("config", &self.inner.config)
            .field("collectors", &self.inner.registry.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Builder for [`HotspotSensor`]
pub struct HotspotSensorBuilder<E: Element> {
    config: SensorConfig,
    handlers: Vec<Box<dyn NotificationHandler<E>>>,
    clock: Option<Arc<dyn WindowClock>>,
}

impl<E: Element> HotspotSensorBuilder<E> {
    /// Create new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SensorConfig::default(),
            handlers: Vec::new(),
            clock: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn channel_size(mut self, channel_size: usize) -> Self {
        self.config.channel_size = channel_size;
        self
    }

    pub fn windows_number(mut self, windows_number: usize) -> Self {
        self.config.windows_number = windows_number;
        self
    }

    pub fn window_size_millis(mut self, window_size_millis: u64) -> Self {
        self.config.window_size_millis = window_size_millis;
        self
    }

    pub fn l1_capacity(mut self, l1_capacity: usize) -> Self {
        self.config.l1_capacity = l1_capacity;
        self
    }

    pub fn l2_capacity(mut self, l2_capacity: usize) -> Self {
        self.config.l2_capacity = l2_capacity;
        self
    }

    pub fn hot_threshold(mut self, hot_threshold: u64) -> Self {
        self.config.hot_threshold = hot_threshold;
        self
    }

    pub fn l2_strategy(mut self, l2_strategy: L2Strategy) -> Self {
        self.config.l2_strategy = l2_strategy;
        self
    }

    pub fn tick_interval_millis(mut self, tick_interval_millis: u64) -> Self {
        self.config.tick_interval_millis = tick_interval_millis;
        self
    }

    /// Append a handler; handlers run in the order they were added
    pub fn add_notification_handler<H>(mut self, handler: H) -> Self
    where
        H: NotificationHandler<E> + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Use `clock` instead of starting a ticking watch
    pub fn with_clock(mut self, clock: Arc<dyn WindowClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and start the pipeline
    pub fn build(self) -> SensorResult<HotspotSensor<E>> {
        let config = self.config;
        config.validate()?;

        let (clock, watch) = match self.clock {
            Some(clock) => (clock, None),
            None => {
                let watch = Arc::new(Watch::with_tick_interval(
                    config.window_size_millis,
                    Duration::from_millis(config.tick_interval_millis),
                )?);
                (watch.clone() as Arc<dyn WindowClock>, Some(watch))
            }
        };

        let stats = Arc::new(SensorStatistics::new());
        let (sender, receiver) = hand_off_channel(config.channel_size, stats.clone())?;
        let latest = LatestNotification::new();
        let aggregator = Aggregator::new(
            config.windows_number,
            clock.current_window_id(),
            config.hot_threshold,
            self.handlers,
            latest.clone(),
            stats.clone(),
        )?;
        let consumer = spawn_consumer(aggregator, receiver, stats.clone())?;
        let consumer_thread = consumer.thread().id();

        let factory = CollectorFactory::new(
            sender,
            clock,
            stats.clone(),
            config.l1_capacity,
            config.l2_capacity,
            config.l2_strategy,
        );

        log::info!(
            "hotspot sensor started: {} windows of {} ms, threshold {}",
            config.windows_number,
            config.window_size_millis,
            config.hot_threshold
        );

        Ok(HotspotSensor {
            inner: Arc::new(SensorInner {
                config,
                registry: CollectorRegistry::new(factory),
                latest,
                stats,
                consumer: Mutex::new(Some(consumer)),
                consumer_thread,
                watch,
                shut_down: AtomicBool::new(false),
            }),
        })
    }
}

impl<E: Element> Default for HotspotSensorBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> fmt::Debug for HotspotSensorBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotSensorBuilder")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}
