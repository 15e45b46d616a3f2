//! Global window state held in each ring slot

use std::collections::{HashMap, HashSet};

use crate::hotspot::collector::CollectorId;
use crate::hotspot::traits::{Element, Entry};

/// Element to count accumulator
#[derive(Debug, Clone)]
pub struct WindowCounter<E: Element> {
    counts: HashMap<E, u64>,
}

impl<E: Element> Default for WindowCounter<E> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<E: Element> WindowCounter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, element: E, count: u64) {
        let slot = self.counts.entry(element).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Fold every count of `other` into this counter
    pub fn merge_all(&mut self, other: &WindowCounter<E>) {
        for (element, count) in &other.counts {
            self.merge(element.clone(), *count);
        }
    }

    pub fn get(&self, element: &E) -> Option<u64> {
        self.counts.get(element).copied()
    }

    pub fn entries(&self) -> Vec<Entry<E>> {
        self.counts
            .iter()
            .map(|(element, count)| Entry::counted(element.clone(), *count))
            .collect()
    }

    /// Entries whose count is at least `threshold`
    pub fn filter_at_least(&self, threshold: u64) -> HashSet<Entry<E>> {
        self.counts
            .iter()
            .filter(|(_, count)| **count >= threshold)
            .map(|(element, count)| Entry::counted(element.clone(), *count))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Clear for reuse, keeping the allocation
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Aggregated contributions of every collector for one window id
#[derive(Debug, Clone)]
pub struct GlobalWindow<E: Element> {
    collector_ids: HashSet<CollectorId>,
    counter: WindowCounter<E>,
    total_count: u64,
}

impl<E: Element> Default for GlobalWindow<E> {
    fn default() -> Self {
        Self {
            collector_ids: HashSet::with_capacity(256),
            counter: WindowCounter::new(),
            total_count: 0,
        }
    }
}

impl<E: Element> GlobalWindow<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one collector's summary
    ///
    /// Returns false, leaving the window untouched, if `collector_id` has
    /// already merged into this window. Each entry count is raised by one to
    /// restore the sighting that tier-1 absorbed before promotion.
    pub fn merge(&mut self, collector_id: CollectorId, entries: &[Entry<E>], total_count: u64) -> bool {
        if !self.collector_ids.insert(collector_id) {
            return false;
        }
        for entry in entries {
            self.counter
                .merge(entry.element().clone(), entry.count().saturating_add(1));
        }
        self.total_count = self.total_count.saturating_add(total_count);
        true
    }

    pub fn counter(&self) -> &WindowCounter<E> {
        &self.counter
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn contains_collector(&self, collector_id: CollectorId) -> bool {
        self.collector_ids.contains(&collector_id)
    }

    pub fn is_empty(&self) -> bool {
        self.collector_ids.is_empty() && self.counter.is_empty() && self.total_count == 0
    }

    /// Clear for reuse
    pub fn clear(&mut self) {
        self.total_count = 0;
        self.collector_ids.clear();
        self.counter.clear();
    }
}
