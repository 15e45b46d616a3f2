//! Hash map backed tier-2 counter

use std::collections::HashMap;

use super::L2Counter;
use crate::hotspot::traits::{Element, Entry, SensorError, SensorResult};

#[derive(Debug)]
pub struct SimpleL2Counter<E: Element> {
    counts: HashMap<E, u32>,
    capacity: usize,
}

impl<E: Element> SimpleL2Counter<E> {
    pub fn new(capacity: usize) -> SensorResult<Self> {
        if capacity == 0 {
            return Err(SensorError::invalid_configuration(
                "l2_capacity must be positive",
            ));
        }
        Ok(Self {
            counts: HashMap::with_capacity(capacity),
            capacity,
        })
    }
}

impl<E: Element> L2Counter<E> for SimpleL2Counter<E> {
    fn increment_if_present(&mut self, element: &E) -> bool {
        match self.counts.get_mut(element) {
            Some(count) => {
                *count = count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    fn add_if_absent_and_not_full(&mut self, element: E) -> bool {
        if self.is_full() || self.counts.contains_key(&element) {
            return false;
        }
        self.counts.insert(element, 1);
        true
    }

    fn is_full(&self) -> bool {
        self.counts.len() == self.capacity
    }

    fn len(&self) -> usize {
        self.counts.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.counts.clear();
    }

    fn entries(&self) -> Vec<Entry<E>> {
        self.counts
            .iter()
            .map(|(element, count)| Entry::counted(element.clone(), u64::from(*count)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;

    #[test]
    fn test_add() {
        contract::check_add(Box::new(SimpleL2Counter::new(2).unwrap()));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(SimpleL2Counter::<u8>::new(0).is_err());
    }
}
