//! Core element, entry and notification contracts
//!
//! Elements are opaque caller values identified only by equality and hash.
//! Entries pair an element with an aggregate count, and notifications carry
//! the immutable hot-set snapshot produced at every window rollover.

use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::Serialize;

use super::types_and_enums::{SensorError, SensorResult};

/// Element trait for values tracked by the sensor
///
/// Implemented automatically for every type with the required bounds.
pub trait Element: Clone + Eq + Hash + Send + Sync + Debug + 'static {
    /// Stable 64-bit hash used by array-backed tables
    fn sensor_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher;

        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl<T> Element for T where T: Clone + Eq + Hash + Send + Sync + Debug + 'static {}

/// Element and count, immutable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entry<E> {
    element: E,
    count: u64,
}

impl<E> Entry<E> {
    /// Create entry, rejecting counts below one
    pub fn new(element: E, count: u64) -> SensorResult<Self> {
        if count < 1 {
            return Err(SensorError::invalid_argument(format!("count: {}", count)));
        }
        Ok(Self { element, count })
    }

    /// Construct without validation; callers guarantee `count >= 1`
    #[inline(always)]
    pub(crate) fn counted(element: E, count: u64) -> Self {
        debug_assert!(count >= 1);
        Self { element, count }
    }

    #[inline(always)]
    pub fn element(&self) -> &E {
        &self.element
    }

    #[inline(always)]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Split into element and count
    pub fn into_parts(self) -> (E, u64) {
        (self.element, self.count)
    }
}

impl<E: Display> Display for Entry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.element, self.count)
    }
}

/// Hot-set snapshot dispatched once per rollover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification<E: Eq + Hash> {
    element_set_changed: bool,
    hot_elements: HashSet<E>,
    entry_set_changed: bool,
    hot_entries: HashSet<Entry<E>>,
    total_count: u64,
}

impl<E: Eq + Hash> Notification<E> {
    pub fn new(
        element_set_changed: bool,
        hot_elements: HashSet<E>,
        entry_set_changed: bool,
        hot_entries: HashSet<Entry<E>>,
        total_count: u64,
    ) -> Self {
        Self {
            element_set_changed,
            hot_elements,
            entry_set_changed,
            hot_entries,
            total_count,
        }
    }

    /// Snapshot with no hot elements and no accesses
    pub fn empty() -> Self {
        Self::new(false, HashSet::new(), false, HashSet::new(), 0)
    }

    /// Is the hot element set different from the previous rollover
    pub fn element_set_changed(&self) -> bool {
        self.element_set_changed
    }

    /// All hot elements
    pub fn hot_elements(&self) -> &HashSet<E> {
        &self.hot_elements
    }

    /// Is the hot entry set different from the previous rollover
    ///
    /// A change in element or in count both count as an entry change, so an
    /// element set change always implies an entry set change but not the
    /// other way round.
    pub fn entry_set_changed(&self) -> bool {
        self.entry_set_changed
    }

    /// All hot elements with their aggregate counts
    pub fn hot_entries(&self) -> &HashSet<Entry<E>> {
        &self.hot_entries
    }

    /// Total accesses over the windows that contributed to this snapshot
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Observer invoked synchronously on the aggregator thread at every rollover
pub trait NotificationHandler<E: Eq + Hash>: Send {
    fn handle_notification(&mut self, notification: &Notification<E>);
}

impl<E, F> NotificationHandler<E> for F
where
    E: Eq + Hash,
    F: FnMut(&Notification<E>) + Send,
{
    fn handle_notification(&mut self, notification: &Notification<E>) {
        self(notification)
    }
}
