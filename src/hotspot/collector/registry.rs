//! Thread-bound collector registry
//!
//! Backs the shared `increase` entry point. Each producer thread lazily gets
//! its own collector slot in a [`ThreadLocal`], so the lookup on the access
//! path takes no shared lock. The slot mutex is padded and only contended
//! while `flush_elapsed` sweeps it.
//!
//! A collector lives as long as its thread. When the thread exits, its
//! collector is dropped and the unfinished window is parked as a summary;
//! the next access from any thread, `flush_elapsed` or shutdown hands it to
//! the channel. Slots of exited threads are reused, so memory follows the
//! peak number of live producers.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::thread;

use crossbeam_utils::CachePadded;
use thread_local::ThreadLocal;

use super::local::{Collector, CollectorFactory, CollectorId};
use crate::hotspot::channel::WindowSummary;
use crate::hotspot::traits::{Element, SensorResult};

type Slot<E> = CachePadded<Mutex<Option<Collector<E>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Collectors bound to producer threads
pub struct CollectorRegistry<E: Element> {
    slots: ThreadLocal<Arc<Slot<E>>>,
    retired: Arc<Retired<E>>,
    factory: CollectorFactory<E>,
}

impl<E: Element> CollectorRegistry<E> {
    pub fn new(factory: CollectorFactory<E>) -> Self {
        Self {
            slots: ThreadLocal::new(),
            retired: Arc::new(Retired::new()),
            factory,
        }
    }

    /// Record one access on the calling thread's collector
    pub fn access(&self, element: E) -> SensorResult<()> {
        self.with_current(|collector| collector.access(element))
    }

    /// Run `f` against the calling thread's collector, creating it if needed
    pub fn with_current<R>(&self, f: impl FnOnce(&mut Collector<E>) -> R) -> SensorResult<R> {
        if self.retired.has_pending() {
            self.hand_over_retired();
        }

        let slot = self
            .slots
            .get_or(|| Arc::new(CachePadded::new(Mutex::new(None))));
        let mut guard = lock(slot);
        let collector = match guard.as_mut() {
            Some(collector) => collector,
            None => guard.insert(self.register_current(slot)?),
        };
        Ok(f(collector))
    }

    fn register_current(&self, slot: &Arc<Slot<E>>) -> SensorResult<Collector<E>> {
        let collector = self.factory.create()?;
        let registered = on_thread_exit(Box::new(ParkOnExit {
            slot: Arc::downgrade(slot),
            retired: Arc::downgrade(&self.retired),
            collector_id: collector.id(),
        }));
        log::debug!(
            "registered collector {} for thread {:?}, exit hook {}",
            collector.id(),
            thread::current().id(),
            if registered { "installed" } else { "unavailable" }
        );
        Ok(collector)
    }

    /// Drop the calling thread's collector, handing over its pending window
    pub fn release_current(&self) -> Option<CollectorId> {
        let collector = lock(self.slots.get()?).take()?;
        prune_exit_hooks();

        let id = collector.id();
        if let Some(summary) = collector.into_summary() {
            self.factory.sender().submit(summary);
        }
        Some(id)
    }

    /// Flush every live collector whose window has elapsed, plus the parked
    /// windows of exited threads
    ///
    /// Returns the number of windows handed to the channel.
    pub fn flush_elapsed(&self) -> usize {
        let live = self
            .slots
            .iter()
            .filter(|slot| lock(slot).as_mut().is_some_and(Collector::flush_if_elapsed))
            .count();
        live + self.hand_over_retired()
    }

    /// Submit the windows parked by exited threads
    pub fn hand_over_retired(&self) -> usize {
        let summaries = self.retired.take();
        let count = summaries.len();
        for summary in summaries {
            self.factory.sender().submit(summary);
        }
        count
    }

    /// Collectors of live threads
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Windows parked by exited threads, waiting for hand-off
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    pub fn factory(&self) -> &CollectorFactory<E> {
        &self.factory
    }
}

impl<E: Element> fmt::Debug for CollectorRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.len())
            .field("retired", &self.retired_len())
            .field("factory", &self.factory)
            .finish()
    }
}

/// Summaries of exited threads
struct Retired<E> {
    /// Mirrors `summaries.len()`; read on every access
    pending: CachePadded<AtomicUsize>,
    summaries: Mutex<Vec<WindowSummary<E>>>,
}

impl<E> Retired<E> {
    fn new() -> Self {
        Self {
            pending: CachePadded::new(AtomicUsize::new(0)),
            summaries: Mutex::new(Vec::new()),
        }
    }

    fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Relaxed) > 0
    }

    fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn push(&self, summary: WindowSummary<E>) {
        let mut summaries = lock(&self.summaries);
        summaries.push(summary);
        self.pending.fetch_add(1, Ordering::Release);
    }

    fn take(&self) -> Vec<WindowSummary<E>> {
        let mut summaries = lock(&self.summaries);
        let taken = std::mem::take(&mut *summaries);
        self.pending.fetch_sub(taken.len(), Ordering::Release);
        taken
    }
}

/// Work to run when the current thread exits
trait ThreadExit {
    /// False once there is nothing left for this hook to do
    fn is_live(&self) -> bool;

    fn run(&self);
}

/// Parks a thread's collector window when the thread exits
///
/// Runs during thread-local teardown, so it only touches mutexes; the
/// channel hand-off happens later on another thread.
struct ParkOnExit<E: Element> {
    slot: Weak<Slot<E>>,
    retired: Weak<Retired<E>>,
    collector_id: CollectorId,
}

impl<E: Element> ParkOnExit<E> {
    fn owns(&self, collector: &Option<Collector<E>>) -> bool {
        collector
            .as_ref()
            .is_some_and(|collector| collector.id() == self.collector_id)
    }
}

impl<E: Element> ThreadExit for ParkOnExit<E> {
    fn is_live(&self) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        match slot.try_lock() {
            Ok(guard) => self.owns(&guard),
            Err(TryLockError::Poisoned(poisoned)) => self.owns(&poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => true,
        }
    }

    fn run(&self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        // the slot may already belong to a newer thread
        let collector = lock(&slot).take_if(|collector| collector.id() == self.collector_id);
        if let (Some(collector), Some(retired)) = (collector, self.retired.upgrade())
            && let Some(summary) = collector.into_summary()
        {
            retired.push(summary);
        }
    }
}

struct ExitHooks(RefCell<Vec<Box<dyn ThreadExit>>>);

impl Drop for ExitHooks {
    fn drop(&mut self) {
        for hook in self.0.get_mut().drain(..) {
            hook.run();
        }
    }
}

thread_local! {
    static EXIT_HOOKS: ExitHooks = const { ExitHooks(RefCell::new(Vec::new())) };
}

/// Returns false if the thread is already tearing down its locals
fn on_thread_exit(hook: Box<dyn ThreadExit>) -> bool {
    EXIT_HOOKS
        .try_with(|hooks| {
            let mut hooks = hooks.0.borrow_mut();
            hooks.retain(|existing| existing.is_live());
            hooks.push(hook);
        })
        .is_ok()
}

fn prune_exit_hooks() {
    let _ = EXIT_HOOKS.try_with(|hooks| hooks.0.borrow_mut().retain(|existing| existing.is_live()));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hotspot::channel::{ChannelMessage, HandOffReceiver, hand_off_channel};
    use crate::hotspot::clock::ManualWatch;
    use crate::hotspot::config::L2Strategy;
    use crate::telemetry::sensor_stats::SensorStatistics;

    fn registry(clock: Arc<ManualWatch>) -> (CollectorRegistry<u32>, HandOffReceiver<u32>) {
        let stats = Arc::new(SensorStatistics::new());
        let (sender, receiver) = hand_off_channel(256, stats.clone()).unwrap();
        let factory = CollectorFactory::new(sender, clock, stats, 4, 4, L2Strategy::Simple);
        (CollectorRegistry::new(factory), receiver)
    }

    fn next_summary(receiver: &HandOffReceiver<u32>) -> WindowSummary<u32> {
        match receiver.recv() {
            Some(ChannelMessage::Summary(summary)) => summary,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_one_collector_per_thread() {
        let clock = Arc::new(ManualWatch::new());
        let (registry, receiver) = registry(clock);
        let registry = Arc::new(registry);

        registry.access(1).unwrap();
        registry.access(1).unwrap();
        let main_id = registry.with_current(|c| c.id()).unwrap();

        let other = registry.clone();
        let other_id = std::thread::spawn(move || {
            other.access(1).unwrap();
            other.with_current(|c| c.id()).unwrap()
        })
        .join()
        .unwrap();

        assert_ne!(main_id, other_id);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.retired_len(), 1);
        assert_eq!(registry.with_current(|c| c.total_count()).unwrap(), 2);

        // the exited thread's window went out with the access above
        assert_eq!(registry.retired_len(), 0);
        let summary = next_summary(&receiver);
        assert_eq!(summary.collector_id, other_id);
        assert_eq!(summary.total_count, 1);
    }

    #[test]
    fn test_exited_threads_release_their_collectors() {
        let clock = Arc::new(ManualWatch::new());
        let (registry, receiver) = registry(clock);
        let registry = Arc::new(registry);

        for element in 0..100 {
            let registry = registry.clone();
            std::thread::spawn(move || registry.access(element).unwrap())
                .join()
                .unwrap();
        }

        assert_eq!(registry.len(), 0);
        assert_eq!(registry.retired_len(), 100);

        assert_eq!(registry.flush_elapsed(), 100);
        assert_eq!(registry.retired_len(), 0);
        let total: u64 = (0..100).map(|_| next_summary(&receiver).total_count).sum();
        assert_eq!(total, 100);
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_flush_elapsed_and_release() {
        let clock = Arc::new(ManualWatch::new());
        let (registry, receiver) = registry(clock.clone());

        registry.access(7).unwrap();
        registry.access(7).unwrap();
        assert_eq!(registry.flush_elapsed(), 0);

        clock.advance(1);
        assert_eq!(registry.flush_elapsed(), 1);
        let summary = next_summary(&receiver);
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.entries.len(), 1);

        assert!(registry.release_current().is_some());
        assert!(registry.is_empty());
        assert!(registry.release_current().is_none());
        // nothing was recorded since the flush
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_release_hands_over_pending_window() {
        let clock = Arc::new(ManualWatch::new());
        let (registry, receiver) = registry(clock);

        registry.access(5).unwrap();
        let id = registry.release_current().unwrap();
        let summary = next_summary(&receiver);
        assert_eq!(summary.collector_id, id);
        assert_eq!(summary.total_count, 1);

        // a later access starts a fresh collector
        registry.access(5).unwrap();
        assert_ne!(registry.with_current(|c| c.id()).unwrap(), id);
        assert_eq!(registry.len(), 1);
    }
}
