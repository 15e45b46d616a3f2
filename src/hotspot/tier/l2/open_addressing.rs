//! Open-addressing tier-2 counter
//!
//! Fixed-capacity table of `next_prime(capacity / LOAD_FACTOR)` slots backed
//! by parallel hash, element and count arrays. Collisions are resolved by
//! double hashing: start at `hash % table_size`, then step backwards by
//! `1 + hash % (table_size - 2)` with wraparound. The table size is prime and
//! the step lies in `1..table_size`, so the probe visits every slot.
//!
//! Individual deletion is not supported; `clear` resets everything at once,
//! so no tombstones exist.

use super::L2Counter;
use super::primes::next_prime;
use crate::hotspot::traits::{Element, Entry, SensorError, SensorResult};

const LOAD_FACTOR: f64 = 0.5;

/// Smallest table that keeps the probe step well defined
const MIN_TABLE_SIZE: usize = 3;

/// Probe outcome
enum Slot {
    Found(usize),
    Vacant(usize),
}

#[derive(Debug)]
pub struct OpenAddressingL2Counter<E: Element> {
    hashes: Vec<u64>,
    elements: Vec<Option<E>>,
    counts: Vec<u32>,
    table_size: usize,
    size: usize,
    capacity: usize,
}

impl<E: Element> OpenAddressingL2Counter<E> {
    pub fn new(capacity: usize) -> SensorResult<Self> {
        if capacity == 0 {
            return Err(SensorError::invalid_configuration(
                "l2_capacity must be positive",
            ));
        }
        let table_size = Self::table_size_for(capacity)?;

        Ok(Self {
            hashes: vec![0; table_size],
            elements: std::iter::repeat_with(|| None).take(table_size).collect(),
            counts: vec![0; table_size],
            table_size,
            size: 0,
            capacity,
        })
    }

    /// Table size for a given capacity, failing outside the prime table
    pub fn table_size_for(capacity: usize) -> SensorResult<usize> {
        let wanted = ((capacity as f64) / LOAD_FACTOR).ceil() as usize;
        next_prime(wanted.max(MIN_TABLE_SIZE))
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    fn probe(&self, element: &E, hash: u64) -> Slot {
        let table_size = self.table_size as u64;
        let mut position = (hash % table_size) as usize;
        let step = (1 + hash % (table_size - 2)) as usize;

        loop {
            match &self.elements[position] {
                None => return Slot::Vacant(position),
                Some(existing) if self.hashes[position] == hash && existing == element => {
                    return Slot::Found(position);
                }
                Some(_) => {
                    position = if position >= step {
                        position - step
                    } else {
                        position + self.table_size - step
                    };
                }
            }
        }
    }
}

impl<E: Element> L2Counter<E> for OpenAddressingL2Counter<E> {
    fn increment_if_present(&mut self, element: &E) -> bool {
        let hash = element.sensor_hash();
        match self.probe(element, hash) {
            Slot::Found(position) => {
                self.counts[position] = self.counts[position].saturating_add(1);
                true
            }
            Slot::Vacant(_) => false,
        }
    }

    fn add_if_absent_and_not_full(&mut self, element: E) -> bool {
        if self.is_full() {
            return false;
        }
        let hash = element.sensor_hash();
        match self.probe(&element, hash) {
            Slot::Found(_) => false,
            Slot::Vacant(position) => {
                self.hashes[position] = hash;
                self.elements[position] = Some(element);
                self.counts[position] = 1;
                self.size += 1;
                true
            }
        }
    }

    fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    fn len(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.hashes.fill(0);
        self.elements.fill(None);
        self.counts.fill(0);
        self.size = 0;
    }

    fn entries(&self) -> Vec<Entry<E>> {
        let mut result = Vec::with_capacity(self.size);
        for (element, count) in self.elements.iter().zip(&self.counts) {
            if let Some(element) = element {
                result.push(Entry::counted(element.clone(), u64::from(*count)));
                if result.len() == self.size {
                    break;
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;

    /// Every element hashes to the same slot
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Colliding(u32);

    impl std::hash::Hash for Colliding {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            0u8.hash(state);
        }
    }

    #[test]
    fn test_add() {
        contract::check_add(Box::new(OpenAddressingL2Counter::new(2).unwrap()));
    }

    #[test]
    fn test_table_size() {
        assert_eq!(OpenAddressingL2Counter::<u8>::table_size_for(1).unwrap(), 3);
        assert_eq!(OpenAddressingL2Counter::<u8>::table_size_for(100).unwrap(), 211);
        assert_eq!(OpenAddressingL2Counter::<u8>::table_size_for(200).unwrap(), 401);
        assert!(OpenAddressingL2Counter::<u8>::new(usize::MAX / 4).is_err());
    }

    #[test]
    fn test_full_collisions_probe_whole_table() {
        let capacity = 10;
        let mut c = OpenAddressingL2Counter::new(capacity).unwrap();
        for i in 0..capacity as u32 {
            assert!(c.add_if_absent_and_not_full(Colliding(i)));
        }
        assert!(c.is_full());
        for i in 0..capacity as u32 {
            assert!(c.increment_if_present(&Colliding(i)));
        }
        assert!(!c.increment_if_present(&Colliding(99)));
        assert!(c.entries().iter().all(|e| e.count() == 2));
        assert_eq!(c.entries().len(), capacity);
    }

    #[test]
    fn test_clear_resets_every_slot() {
        let mut c = OpenAddressingL2Counter::new(4).unwrap();
        for i in 0..4u32 {
            c.add_if_absent_and_not_full(i);
        }
        c.clear();
        assert!(c.elements.iter().all(Option::is_none));
        assert!(c.counts.iter().all(|count| *count == 0));
        assert!(c.hashes.iter().all(|hash| *hash == 0));
        assert_eq!(c.len(), 0);
    }
}
