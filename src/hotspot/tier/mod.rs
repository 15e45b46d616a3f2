//! Local promotion tiers owned by each collector
//!
//! Tier-1 remembers recent first sightings; an element seen a second time
//! before eviction is promoted into the tier-2 exact counter.

pub mod l1;
pub mod l2;

pub use l1::RecencyBuffer;
pub use l2::{L2Counter, OpenAddressingL2Counter, SimpleL2Counter};
