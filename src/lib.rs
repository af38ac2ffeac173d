//! equipment-dash: Heavy-Equipment Telemetry Dashboard Core
//!
//! State and update engine behind the equipment monitoring dashboard.
//!
//! ## Architecture
//!
//! - **Feeds**: three synthetic telemetry generators (vibration, noise, RPM/PM),
//!   each with its own timer and bounded buffer
//! - **Status Aggregator**: reduces the feed buffers to one snapshot per tick
//!   under a `latest` or windowed `avg` policy
//! - **Levels**: success/warning/error classification and the status row
//! - **Rotation**: minute-aligned image-set rotation with pause/resume
//! - **Vehicles**: VIN search for the sidebar

pub mod clock;
pub mod config;
pub mod feeds;
pub mod rotation;
pub mod status;
pub mod task;
pub mod types;
pub mod vehicles;

// Re-export dashboard configuration
pub use config::DashboardConfig;

// Re-export commonly used types
pub use types::{
    AggregationMode, AggregationPolicy, HotSpot, MagnitudeSample, NoiseSample, RpmPmSample,
    StatusSnapshot, Timestamped, VibrationSample,
};

pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock, SystemClock};
pub use feeds::{FeedBuffer, FeedConfig, FeedGenerator, FeedReader, FeedReaders, FeedSet, RunningFeeds};
pub use rotation::{ActiveSet, ImageSet, RotationError, SetRotation};
pub use status::{
    HotSeed, LevelRules, RunningAggregator, StatusAggregator, StatusConfig, StatusLevel,
    StatusRow, StatusView,
};
pub use task::{TaskError, TaskHandle};
pub use vehicles::{SearchHit, VehicleIndex};
