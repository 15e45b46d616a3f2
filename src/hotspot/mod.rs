//! Detection pipeline internals
//!
//! Data flows one way: `collector` -> `channel` -> `aggregator` -> handlers.
//! Everything a collector touches is owned by its producer; everything the
//! aggregator touches is owned by the consumer thread.

pub mod aggregator;
pub mod channel;
pub mod clock;
pub mod collector;
pub mod config;
pub mod export;
pub mod tier;
pub mod traits;
