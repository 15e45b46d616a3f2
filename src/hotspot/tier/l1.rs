//! Tier-1 recency buffer
//!
//! A bounded least-recently-put buffer. The recency order is a doubly-linked
//! list threaded through a slot vector by index, with a hash index from
//! element to slot, giving O(1) put and tail eviction. A hit on `put` removes
//! the element and hands it back to the caller, signalling a second local
//! sighting.
//!
//! Owned by exactly one collector; no interior synchronization.

use std::collections::HashMap;

use crate::hotspot::traits::{Element, SensorError, SensorResult};

const NIL: usize = usize::MAX;

/// Slot in the recency list
#[derive(Debug)]
struct Node<E> {
    element: E,
    prev: usize,
    next: usize,
}

/// Bounded least-recently-put buffer
#[derive(Debug)]
pub struct RecencyBuffer<E: Element> {
    capacity: usize,
    nodes: Vec<Node<E>>,
    free_slots: Vec<usize>,
    index: HashMap<E, usize>,
    head: usize,
    tail: usize,
}

impl<E: Element> RecencyBuffer<E> {
    /// Create buffer holding at most `capacity` elements
    pub fn new(capacity: usize) -> SensorResult<Self> {
        if capacity == 0 {
            return Err(SensorError::invalid_configuration(
                "l1_capacity must be positive",
            ));
        }
        Ok(Self {
            capacity,
            nodes: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
        })
    }

    /// Put element into the buffer
    ///
    /// 1. If present, remove it and return it.
    /// 2. If absent and not full, insert at the head and return `None`.
    /// 3. If absent and full, evict the tail silently, insert at the head and
    ///    return `None`.
    pub fn put(&mut self, element: E) -> Option<E> {
        if let Some(slot) = self.index.remove(&element) {
            self.unlink(slot);
            self.free_slots.push(slot);
            return Some(element);
        }

        if self.is_full() {
            let victim = self.tail;
            self.unlink(victim);
            self.index.remove(&self.nodes[victim].element);
            self.free_slots.push(victim);
        }

        let slot = self.allocate(element.clone());
        self.push_front(slot);
        self.index.insert(element, slot);
        None
    }

    pub fn is_full(&self) -> bool {
        self.index.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, element: &E) -> bool {
        self.index.contains_key(element)
    }

    /// Drop all elements, keeping allocations
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_slots.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Live elements, unordered
    pub fn elements(&self) -> impl Iterator<Item = &E> {
        self.index.keys()
    }

    /// Live elements from most to least recently put
    #[cfg(test)]
    pub(crate) fn iter_recent(&self) -> RecentIter<'_, E> {
        RecentIter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn allocate(&mut self, element: E) -> usize {
        let node = Node {
            element,
            prev: NIL,
            next: NIL,
        };
        match self.free_slots.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let prev = self.nodes[slot].prev;
        let next = self.nodes[slot].next;

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = NIL;
    }
}

/// Iterator over the recency order, head first
#[cfg(test)]
pub(crate) struct RecentIter<'a, E> {
    nodes: &'a [Node<E>],
    cursor: usize,
}

#[cfg(test)]
impl<'a, E> Iterator for RecentIter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.nodes[self.cursor];
        self.cursor = node.next;
        Some(&node.element)
    }
}
