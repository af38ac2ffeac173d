//! Dashboard Configuration Module
//!
//! Feed timers, aggregation policy, level thresholds, the image-set rotation
//! and the vehicle list, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `EQUIP_DASH_CONFIG` environment variable (path to TOML file)
//! 2. `dashboard.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = DashboardConfig::load();
//! let feeds = FeedSet::from_config(&config.feeds, clock.clone(), None);
//! let status = StatusAggregator::new(config.status.to_status_config(), feeds.readers(), clock);
//! ```

mod dashboard_config;
pub mod defaults;
pub mod validation;

pub use dashboard_config::*;
