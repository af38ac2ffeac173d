//! Status aggregation
//!
//! Reduces the three feed buffers to one [`StatusSnapshot`](crate::types::StatusSnapshot)
//! on a fixed tick, under either the `latest` or the windowed `avg` policy.
//!
//! - [`aggregate`]: the pure reduction, deterministic in its inputs
//! - [`aggregator`]: the timer-driven runtime and its read/write handles
//! - [`levels`]: indicator levels and the formatted status row
//!
//! ## Usage
//!
//! ```ignore
//! let aggregator = StatusAggregator::new(config.status.clone().into(), feeds.readers(), clock);
//! let running = aggregator.start(cancel.child_token());
//! let view = running.view();
//! println!("{}", StatusRow::build(&view.current(), None, &LevelRules::default()));
//! ```

pub mod aggregate;
pub mod aggregator;
pub mod levels;

pub use aggregate::{aggregate, reduce_metric, round0, round2, window_mean, StatusInputs, WindowMean};
pub use aggregator::{HotSeed, RunningAggregator, StatusAggregator, StatusConfig, StatusView};
pub use levels::{
    HotLimits, LevelRules, StatusItem, StatusKey, StatusLevel, StatusRow, StatusValue, TempLimit,
};
