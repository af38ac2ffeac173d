//! Dashboard Configuration - feed timers, aggregation policy, level thresholds
//! and the image-set rotation as operator-tunable TOML values.
//!
//! Every section implements `Default` with the values the dashboard ships with,
//! so a missing file or a partial file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::feeds::rules::{VIBRATION_MAX, VIBRATION_MIN, VIBRATION_STEP};
use crate::feeds::FeedConfig;
use crate::rotation::ImageSet;
use crate::status::{LevelRules, StatusConfig};
use crate::types::{AggregationMode, AggregationPolicy, HotSpot};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of one dashboard deployment.
///
/// Load with `DashboardConfig::load()` which searches:
/// 1. `$EQUIP_DASH_CONFIG` env var
/// 2. `./dashboard.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Feed timers and buffer sizes
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Status aggregation policy
    #[serde(default)]
    pub status: StatusSection,

    /// Status-level thresholds
    #[serde(default)]
    pub levels: LevelRules,

    /// Image-set rotation
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Known vehicle identifiers, in display order
    #[serde(default = "default_vehicles")]
    pub vehicles: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feeds: FeedsConfig::default(),
            status: StatusSection::default(),
            levels: LevelRules::default(),
            rotation: RotationConfig::default(),
            vehicles: default_vehicles(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration using the standard search order:
    /// 1. `$EQUIP_DASH_CONFIG` environment variable
    /// 2. `./dashboard.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded dashboard config from EQUIP_DASH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from EQUIP_DASH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "EQUIP_DASH_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./dashboard.toml
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded dashboard config from ./dashboard.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./dashboard.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No dashboard.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;

        for w in super::validation::validate_suspicious_values(&config) {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section for internal consistency.
    ///
    /// Rules:
    /// - Timer intervals and buffer capacities must be > 0
    /// - Numeric values must be finite
    /// - Walk bounds and level thresholds must not be inverted
    /// - Each image set's low limit must be below its high limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Feeds
        let f = &self.feeds;
        Self::check_feed(&f.vibration.feed(), "feeds.vibration", &mut errors);
        Self::check_feed(&f.noise, "feeds.noise", &mut errors);
        Self::check_feed(&f.rpm_pm, "feeds.rpm_pm", &mut errors);

        let walk = &f.vibration.walk;
        Self::check_finite(walk.step, "feeds.vibration.walk.step", &mut errors);
        Self::check_finite(walk.min, "feeds.vibration.walk.min", &mut errors);
        Self::check_finite(walk.max, "feeds.vibration.walk.max", &mut errors);
        if walk.step < 0.0 {
            errors.push(format!(
                "feeds.vibration.walk.step must be >= 0 (got {:.3})",
                walk.step
            ));
        }
        if walk.min > walk.max {
            errors.push(format!(
                "feeds.vibration.walk: min ({:.3}) must be <= max ({:.3})",
                walk.min, walk.max
            ));
        }

        // Status
        let s = &self.status;
        if s.tick_ms == 0 {
            errors.push("status.tick_ms must be > 0".to_string());
        }
        if s.window_ms <= 0 {
            errors.push(format!("status.window_ms must be > 0 (got {})", s.window_ms));
        }
        if s.min_samples_for_avg == 0 {
            errors.push("status.min_samples_for_avg must be > 0".to_string());
        }
        Self::check_finite(s.hot_seed.engine, "status.hot_seed.engine", &mut errors);
        Self::check_finite(s.hot_seed.hydraulic, "status.hot_seed.hydraulic", &mut errors);

        // Levels: error >= warning
        let l = &self.levels;
        for (value, name) in [
            (l.vibration_min, "levels.vibration_min"),
            (l.vibration_max, "levels.vibration_max"),
            (l.noise_low_warning, "levels.noise_low_warning"),
            (l.noise_warning, "levels.noise_warning"),
            (l.noise_error, "levels.noise_error"),
            (l.pm_warning, "levels.pm_warning"),
            (l.pm_error, "levels.pm_error"),
            (l.temp_fallback_warning, "levels.temp_fallback_warning"),
            (l.temp_fallback_error, "levels.temp_fallback_error"),
        ] {
            Self::check_finite(value, name, &mut errors);
        }
        if l.vibration_min > l.vibration_max {
            errors.push(format!(
                "levels.vibration: min ({:.3}) must be <= max ({:.3})",
                l.vibration_min, l.vibration_max
            ));
        }
        if l.noise_low_warning > l.noise_warning {
            errors.push(format!(
                "levels.noise_low_warning ({:.3}) must be <= noise_warning ({:.3})",
                l.noise_low_warning, l.noise_warning
            ));
        }
        Self::check_escalation(l.noise_warning, l.noise_error, "levels.noise", &mut errors);
        Self::check_escalation(l.pm_warning, l.pm_error, "levels.pm", &mut errors);
        Self::check_escalation(
            l.temp_fallback_warning,
            l.temp_fallback_error,
            "levels.temp_fallback",
            &mut errors,
        );

        // Rotation
        let r = &self.rotation;
        if r.interval_ms <= 0 {
            errors.push(format!("rotation.interval_ms must be > 0 (got {})", r.interval_ms));
        }
        if r.sets.is_empty() {
            errors.push("rotation.sets must contain at least one image set".to_string());
        }
        for (i, set) in r.sets.iter().enumerate() {
            let name = format!("rotation.sets[{i}]");
            for (value, field) in [
                (set.hot.engine, "hot.engine"),
                (set.hot.hydraulic, "hot.hydraulic"),
                (set.low_limit.engine, "low_limit.engine"),
                (set.low_limit.hydraulic, "low_limit.hydraulic"),
                (set.high_limit.engine, "high_limit.engine"),
                (set.high_limit.hydraulic, "high_limit.hydraulic"),
            ] {
                Self::check_finite(value, &format!("{name}.{field}"), &mut errors);
            }
            Self::check_limit(set.low_limit.engine, set.high_limit.engine, &format!("{name}.engine"), &mut errors);
            Self::check_limit(
                set.low_limit.hydraulic,
                set.high_limit.hydraulic,
                &format!("{name}.hydraulic"),
                &mut errors,
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_feed(feed: &FeedConfig, name: &str, errors: &mut Vec<String>) {
        if feed.interval_ms == 0 {
            errors.push(format!("{name}.interval_ms must be > 0"));
        }
        if feed.max_points == 0 {
            errors.push(format!("{name}.max_points must be > 0"));
        }
    }

    fn check_finite(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name} must be a finite number (got {value})"));
        }
    }

    fn check_escalation(warning: f64, error: f64, name: &str, errors: &mut Vec<String>) {
        if error < warning {
            errors.push(format!(
                "{name}: error ({error:.3}) must be >= warning ({warning:.3})"
            ));
        }
    }

    fn check_limit(low: f64, high: f64, name: &str, errors: &mut Vec<String>) {
        if low >= high {
            errors.push(format!(
                "{name}: low limit ({low:.1}) must be below high limit ({high:.1})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Feeds
// ============================================================================

/// Timers and capacities of the three dashboard feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub vibration: VibrationFeedConfig,
    pub noise: FeedConfig,
    pub rpm_pm: FeedConfig,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            vibration: VibrationFeedConfig::default(),
            noise: FeedConfig::new(defaults::FEED_INTERVAL_MS, defaults::NOISE_MAX_POINTS),
            rpm_pm: FeedConfig::new(defaults::FEED_INTERVAL_MS, defaults::RPM_PM_MAX_POINTS),
        }
    }
}

/// Vibration feed: timer, capacity and random-walk tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrationFeedConfig {
    pub interval_ms: u64,
    pub max_points: usize,
    /// Start from a synthetic random-walk history instead of the two literal samples
    pub backfill: bool,
    pub walk: WalkConfig,
}

impl VibrationFeedConfig {
    pub fn feed(&self) -> FeedConfig {
        FeedConfig::new(self.interval_ms, self.max_points)
    }
}

impl Default for VibrationFeedConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::FEED_INTERVAL_MS,
            max_points: defaults::VIBRATION_MAX_POINTS,
            backfill: false,
            walk: WalkConfig::default(),
        }
    }
}

/// Per-axis random walk: `clamp(prev + U(-step, step), min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Maximum change per tick (m/s²)
    pub step: f64,
    /// Lower clamp (m/s²)
    pub min: f64,
    /// Upper clamp (m/s²)
    pub max: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            step: VIBRATION_STEP,
            min: VIBRATION_MIN,
            max: VIBRATION_MAX,
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// `[status]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSection {
    /// `latest` or `avg`
    pub mode: AggregationMode,
    /// Sliding window for `avg` (ms)
    pub window_ms: i64,
    /// Minimum in-window samples before `avg` applies
    pub min_samples_for_avg: usize,
    /// Aggregation tick (ms)
    pub tick_ms: u64,
    /// Hot-spot seed used until an image set provides one (°C)
    pub hot_seed: HotSpot,
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Latest,
            window_ms: defaults::STATUS_WINDOW_MS,
            min_samples_for_avg: defaults::STATUS_MIN_SAMPLES_FOR_AVG,
            tick_ms: defaults::STATUS_TICK_MS,
            hot_seed: HotSpot::default(),
        }
    }
}

impl StatusSection {
    pub fn policy(&self) -> AggregationPolicy {
        AggregationPolicy {
            mode: self.mode,
            window_ms: self.window_ms,
            min_samples_for_avg: self.min_samples_for_avg,
        }
    }

    pub fn to_status_config(&self) -> StatusConfig {
        StatusConfig {
            policy: self.policy(),
            hot_seed: self.hot_seed,
            tick_ms: self.tick_ms,
        }
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// `[rotation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotation period (ms); boundaries are multiples of this since the epoch
    pub interval_ms: i64,
    pub sets: Vec<ImageSet>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::ROTATION_INTERVAL_MS,
            sets: default_image_sets(),
        }
    }
}

fn image_set(n: u8, hot: HotSpot) -> ImageSet {
    ImageSet {
        engine_img: format!("engine_{n:02}.png"),
        hydraulic_img: format!("hydraulic_{n:02}.png"),
        hot,
        low_limit: HotSpot::new(55.0, 50.0),
        high_limit: HotSpot::new(75.0, 70.0),
    }
}

/// Three thermal image pairs: normal, warm and hot.
pub fn default_image_sets() -> Vec<ImageSet> {
    vec![
        image_set(1, HotSpot::new(42.0, 38.0)),
        image_set(2, HotSpot::new(58.4, 47.9)),
        image_set(3, HotSpot::new(77.2, 71.5)),
    ]
}

pub fn default_vehicles() -> Vec<String> {
    [
        "KMFWBX7HP8U100231",
        "KMFWBX7HP8U100232",
        "KMFWBX7HP8U100547",
        "KMFZCX7JP2U201118",
        "KMFZCX7JP2U201276",
        "LZGJL4W48NX009512",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
