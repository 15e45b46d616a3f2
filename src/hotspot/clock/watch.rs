//! Logical window clocks
//!
//! `Watch` keeps a shared millisecond counter that one ticker thread refreshes
//! at sub-window granularity. Readers perform a single relaxed load, so the
//! observed time may lag by up to one tick interval; window sizes are chosen
//! an order of magnitude larger than that interval.
//!
//! `ManualWatch` is advanced explicitly and is used wherever window
//! boundaries must be deterministic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

use super::window_id::WindowId;
use crate::hotspot::traits::{SensorError, SensorResult};

static WATCH_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// Source of the current logical window id
pub trait WindowClock: Send + Sync {
    fn current_window_id(&self) -> WindowId;
}

/// State shared between the watch and its ticker thread
#[derive(Debug)]
struct WatchShared {
    start: Instant,
    elapsed_millis: CachePadded<AtomicU64>,
    shutdown: AtomicBool,
}

/// Ticking wall-clock watch
#[derive(Debug)]
pub struct Watch {
    shared: Arc<WatchShared>,
    window_size_millis: u64,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Watch {
    /// Start a watch with the default 1 ms tick interval
    pub fn start(window_size_millis: u64) -> SensorResult<Self> {
        Self::with_tick_interval(window_size_millis, Duration::from_millis(1))
    }

    /// Start a watch refreshed every `tick_interval`
    pub fn with_tick_interval(window_size_millis: u64, tick_interval: Duration) -> SensorResult<Self> {
        if window_size_millis == 0 {
            return Err(SensorError::invalid_configuration(
                "window_size_millis must be positive",
            ));
        }
        if tick_interval.is_zero() {
            return Err(SensorError::invalid_configuration(
                "tick_interval must be positive",
            ));
        }

        // Counter starts at 0 before the ticker exists, so readers never wait on it.
        let shared = Arc::new(WatchShared {
            start: Instant::now(),
            elapsed_millis: CachePadded::new(AtomicU64::new(0)),
            shutdown: AtomicBool::new(false),
        });

        let instance_id = WATCH_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        let ticker_shared = shared.clone();
        let ticker = thread::Builder::new()
            .name(format!("hotspot-sensor-ticker-{}", instance_id))
            .spawn(move || Self::run_ticker(ticker_shared, tick_interval))
            .map_err(|e| SensorError::worker_failure(format!("failed to spawn ticker: {}", e)))?;

        log::info!(
            "watch {} started, window size {} ms, tick {:?}",
            instance_id,
            window_size_millis,
            tick_interval
        );

        Ok(Self {
            shared,
            window_size_millis,
            ticker: Mutex::new(Some(ticker)),
        })
    }

    fn run_ticker(shared: Arc<WatchShared>, tick_interval: Duration) {
        while !shared.shutdown.load(Ordering::Relaxed) {
            thread::sleep(tick_interval);
            let elapsed = shared.start.elapsed().as_millis() as u64;
            shared.elapsed_millis.store(elapsed, Ordering::Relaxed);
        }
    }

    /// Milliseconds since start as last published by the ticker
    pub fn elapsed_millis(&self) -> u64 {
        self.shared.elapsed_millis.load(Ordering::Relaxed)
    }

    pub fn window_size_millis(&self) -> u64 {
        self.window_size_millis
    }

    /// Stop the ticker thread; the window id freezes at its last value
    pub fn stop(&self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        let handle = match self.ticker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            log::error!("watch ticker thread panicked");
        }
    }
}

impl WindowClock for Watch {
    #[inline(always)]
    fn current_window_id(&self) -> WindowId {
        WindowId::new(self.elapsed_millis() / self.window_size_millis)
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Explicitly advanced clock
#[derive(Debug, Default)]
pub struct ManualWatch {
    current: CachePadded<AtomicU64>,
}

impl ManualWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(window_id: WindowId) -> Self {
        Self {
            current: CachePadded::new(AtomicU64::new(window_id.value())),
        }
    }

    /// Move forward by `windows`, returning the new id
    pub fn advance(&self, windows: u64) -> WindowId {
        let previous = self.current.fetch_add(windows, Ordering::Relaxed);
        WindowId::new(previous + windows)
    }

    /// Jump to `window_id`; never moves backwards
    pub fn set(&self, window_id: WindowId) {
        self.current.fetch_max(window_id.value(), Ordering::Relaxed);
    }
}

impl WindowClock for ManualWatch {
    #[inline(always)]
    fn current_window_id(&self) -> WindowId {
        WindowId::new(self.current.load(Ordering::Relaxed))
    }
}
