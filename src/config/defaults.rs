//! Dashboard default constants.
//!
//! Values the dashboard runs with when no `dashboard.toml` is present.
//! Grouped by subsystem.

// ============================================================================
// Feeds
// ============================================================================

/// Timer interval shared by all three dashboard feeds (ms).
pub const FEED_INTERVAL_MS: u64 = 2_000;

/// Vibration chart capacity (samples).
pub const VIBRATION_MAX_POINTS: usize = 20;

/// Noise chart capacity (samples).
pub const NOISE_MAX_POINTS: usize = 20;

/// RPM/PM chart capacity (samples).
///
/// 30 samples at 2 s = 1 minute of history.
pub const RPM_PM_MAX_POINTS: usize = 30;

// ============================================================================
// Status
// ============================================================================

/// Aggregation tick (ms).
pub const STATUS_TICK_MS: u64 = 500;

/// Sliding window for `avg` mode (ms).
pub const STATUS_WINDOW_MS: i64 = 60_000;

/// Minimum in-window samples before `avg` is used instead of the latest value.
pub const STATUS_MIN_SAMPLES_FOR_AVG: usize = 3;

// ============================================================================
// Rotation
// ============================================================================

/// Image-set rotation period (ms), aligned to the wall-clock minute.
pub const ROTATION_INTERVAL_MS: i64 = 60_000;

// ============================================================================
// Runner
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "EQUIP_DASH_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dashboard.toml";

/// Interval between status-row log lines in the live runner (seconds).
pub const REPORT_INTERVAL_SECS: u64 = 10;
