//! Fixed-size circular buffer of global windows
//!
//! Slots are allocated once and cleared in place as the ring advances. Slot
//! `first_slot` holds `first_window_id`, and offset `k` addresses
//! `(first_slot + k) % len`.

use crate::hotspot::clock::WindowId;
use crate::hotspot::traits::{Element, SensorError, SensorResult};

use super::window::GlobalWindow;

#[derive(Debug)]
pub struct WindowRing<E: Element> {
    windows: Vec<GlobalWindow<E>>,
    first_slot: usize,
    first_window_id: WindowId,
}

impl<E: Element> WindowRing<E> {
    pub fn new(windows_number: usize, first_window_id: WindowId) -> SensorResult<Self> {
        if windows_number == 0 {
            return Err(SensorError::invalid_configuration(
                "windows_number must be positive",
            ));
        }
        Ok(Self {
            windows: (0..windows_number).map(|_| GlobalWindow::new()).collect(),
            first_slot: 0,
            first_window_id,
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn first_window_id(&self) -> WindowId {
        self.first_window_id
    }

    pub fn first_slot(&self) -> usize {
        self.first_slot
    }

    /// Signed distance of `window_id` from the oldest held window
    pub fn offset_of(&self, window_id: WindowId) -> i64 {
        window_id.difference(self.first_window_id)
    }

    #[inline]
    fn index(&self, offset: usize) -> usize {
        (self.first_slot + offset) % self.windows.len()
    }

    /// Window at `offset`; `offset` must be below `len()`
    pub fn slot(&self, offset: usize) -> &GlobalWindow<E> {
        debug_assert!(offset < self.windows.len());
        &self.windows[self.index(offset)]
    }

    pub fn slot_mut(&mut self, offset: usize) -> &mut GlobalWindow<E> {
        debug_assert!(offset < self.windows.len());
        let index = self.index(offset);
        &mut self.windows[index]
    }

    /// The `span` oldest windows, oldest first
    pub fn oldest(&self, span: usize) -> impl Iterator<Item = &GlobalWindow<E>> {
        (0..span.min(self.windows.len())).map(move |offset| self.slot(offset))
    }

    /// Clear the `interval` oldest slots and make `window_id` the oldest
    pub fn advance(&mut self, interval: usize, window_id: WindowId) {
        let interval = interval.min(self.windows.len());
        for offset in 0..interval {
            self.slot_mut(offset).clear();
        }
        self.first_slot = self.index(interval);
        self.first_window_id = window_id;
    }
}
