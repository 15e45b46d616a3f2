//! Tier-2 exact counters
//!
//! Two interchangeable strategies satisfy the same contract: a hash map
//! backed counter and an array-backed open-addressing table. Selection is a
//! configuration choice that only affects performance.

pub mod open_addressing;
pub mod primes;
pub mod simple;

pub use open_addressing::OpenAddressingL2Counter;
pub use primes::{MAX_TABLED_PRIME, next_prime};
pub use simple::SimpleL2Counter;

use crate::hotspot::config::L2Strategy;
use crate::hotspot::traits::{Element, Entry, SensorResult};

/// Bounded exact counter contract
pub trait L2Counter<E: Element>: Send + std::fmt::Debug {
    /// Increase the count of `element` if present
    ///
    /// Returns true if present, false otherwise.
    fn increment_if_present(&mut self, element: &E) -> bool;

    /// Add `element` with count 1 if it is absent and the counter is not full
    ///
    /// Returns true if the element was inserted.
    fn add_if_absent_and_not_full(&mut self, element: E) -> bool;

    /// A full counter accepts no new elements until cleared
    fn is_full(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Remove all elements
    fn clear(&mut self);

    /// All elements with their counts, in no particular order
    fn entries(&self) -> Vec<Entry<E>>;
}

impl L2Strategy {
    /// Create a tier-2 counter of this strategy
    pub fn create<E: Element>(self, capacity: usize) -> SensorResult<Box<dyn L2Counter<E>>> {
        Ok(match self {
            L2Strategy::Simple => Box::new(SimpleL2Counter::new(capacity)?),
            L2Strategy::OpenAddressing => Box::new(OpenAddressingL2Counter::new(capacity)?),
        })
    }
}

/// Shared contract tests run against both strategies
#[cfg(test)]
pub(crate) mod contract {
    use std::collections::HashSet;

    use super::*;

    fn entries(counter: &dyn L2Counter<&'static str>) -> HashSet<(&'static str, u64)> {
        counter
            .entries()
            .into_iter()
            .map(|e| (*e.element(), e.count()))
            .collect()
    }

    pub(crate) fn check_add(mut c: Box<dyn L2Counter<&'static str>>) {
        assert!(c.add_if_absent_and_not_full("a"));
        assert_eq!(entries(c.as_ref()), HashSet::from([("a", 1)]));

        // present
        assert!(!c.add_if_absent_and_not_full("a"));
        assert!(c.add_if_absent_and_not_full("b"));
        assert_eq!(entries(c.as_ref()), HashSet::from([("a", 1), ("b", 1)]));

        // present
        assert!(!c.add_if_absent_and_not_full("b"));

        assert!(c.increment_if_present(&"b"));
        assert_eq!(entries(c.as_ref()), HashSet::from([("a", 1), ("b", 2)]));

        // full
        assert!(c.is_full());
        assert!(!c.add_if_absent_and_not_full("c"));

        assert!(c.increment_if_present(&"a"));
        assert!(c.increment_if_present(&"a"));
        assert_eq!(entries(c.as_ref()), HashSet::from([("a", 3), ("b", 2)]));

        assert!(!c.increment_if_present(&"c"));

        c.clear();
        assert!(c.is_empty());
        assert_eq!(entries(c.as_ref()), HashSet::new());
        assert!(c.add_if_absent_and_not_full("c"));
        assert_eq!(entries(c.as_ref()), HashSet::from([("c", 1)]));
    }

    /// Random operation sequence compared against a `HashMap` model
    pub(crate) fn check_against_model(
        mut c: Box<dyn L2Counter<u16>>,
        capacity: usize,
        ops: &[(bool, u16)],
    ) {
        let mut model: std::collections::HashMap<u16, u64> = std::collections::HashMap::new();
        let mut full_seen = false;

        for &(increment, element) in ops {
            if increment {
                let present = model.get_mut(&element).map(|count| *count += 1).is_some();
                assert_eq!(c.increment_if_present(&element), present);
            } else {
                let insert = !model.contains_key(&element) && model.len() < capacity;
                if full_seen && !model.contains_key(&element) {
                    assert!(!insert);
                }
                if insert {
                    model.insert(element, 1u64);
                }
                assert_eq!(c.add_if_absent_and_not_full(element), insert);
            }
            assert!(c.len() <= capacity);
            full_seen |= c.is_full();
        }

        let got: std::collections::HashMap<u16, u64> = c
            .entries()
            .into_iter()
            .map(|e| e.into_parts())
            .collect();
        assert_eq!(got, model);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_both_strategies_satisfy_contract() {
        contract::check_add(L2Strategy::Simple.create(2).unwrap());
        contract::check_add(L2Strategy::OpenAddressing.create(2).unwrap());
    }

    proptest! {
        #[test]
        fn prop_strategies_match_model(
            capacity in 1_usize..16,
            ops in proptest::collection::vec((any::<bool>(), 0_u16..40), 0..300),
        ) {
            contract::check_against_model(L2Strategy::Simple.create(capacity).unwrap(), capacity, &ops);
            contract::check_against_model(
                L2Strategy::OpenAddressing.create(capacity).unwrap(),
                capacity,
                &ops,
            );
        }
    }
}
