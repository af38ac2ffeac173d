//! Shared data structures for the equipment telemetry dashboard
//!
//! - Samples: timestamped measurements produced by the synthetic feeds
//! - Status: hot-spot seed, aggregation policy and the rolled-up snapshot

mod sample;
mod status;

pub use sample::*;
pub use status::*;
