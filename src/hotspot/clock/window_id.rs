//! Discrete logical window identifiers

use serde::{Deserialize, Serialize};

/// Logical window id, `(now - start) / window_size`, 0-based
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct WindowId(u64);

impl WindowId {
    pub const ZERO: WindowId = WindowId(0);

    #[inline(always)]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[inline(always)]
    pub fn after(self, other: WindowId) -> bool {
        self.0 > other.0
    }

    #[inline(always)]
    pub fn before(self, other: WindowId) -> bool {
        self.0 < other.0
    }

    /// Signed distance `self - other`
    #[inline(always)]
    pub fn difference(self, other: WindowId) -> i64 {
        (self.0 as i128 - other.0 as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl From<u64> for WindowId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T[{}]", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_helpers() {
        let w1 = WindowId::new(3);
        let w2 = WindowId::new(5);
        assert!(w2.after(w1));
        assert!(w1.before(w2));
        assert!(!w1.after(w1));
        assert_eq!(w2.difference(w1), 2);
        assert_eq!(w1.difference(w2), -2);
        assert_eq!(w1.next(), WindowId::new(4));
        assert_eq!(w1.to_string(), "T[3]");
    }
}
