//! Status-level classification and the one-line status row.
//!
//! Each displayed value carries a level (success / warning / error) used
//! for its indicator dot. Temperature levels come from the active image
//! set's limits when available and from fixed fallbacks otherwise.

use serde::{Deserialize, Serialize};

use crate::types::{HotSpot, StatusSnapshot};

/// Indicator level of one status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLevel::Success => write!(f, "OK"),
            StatusLevel::Warning => write!(f, "WARN"),
            StatusLevel::Error => write!(f, "ERR"),
        }
    }
}

/// Warning/error temperature limits for one hot-spot sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempLimit {
    pub low: f64,
    pub high: f64,
}

/// Per-sensor temperature limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotLimits {
    pub engine: TempLimit,
    pub hydraulic: TempLimit,
}

impl HotLimits {
    /// Pair up separate low/high hot-spot records.
    pub fn from_bounds(low: HotSpot, high: HotSpot) -> Self {
        Self {
            engine: TempLimit {
                low: low.engine,
                high: high.engine,
            },
            hydraulic: TempLimit {
                low: low.hydraulic,
                high: high.hydraulic,
            },
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Classification thresholds (operator-tunable via `[levels]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRules {
    /// Vibration below this is abnormal (m/s²)
    pub vibration_min: f64,
    /// Vibration above this is abnormal (m/s²)
    pub vibration_max: f64,
    /// Noise below this is a warning (dB)
    pub noise_low_warning: f64,
    /// Noise at or above this is a warning (dB)
    pub noise_warning: f64,
    /// Noise at or above this is an error (dB)
    pub noise_error: f64,
    pub pm_warning: f64,
    pub pm_error: f64,
    /// Temperature warning when no set limits are known (°C)
    pub temp_fallback_warning: f64,
    /// Temperature error when no set limits are known (°C)
    pub temp_fallback_error: f64,
}

impl Default for LevelRules {
    fn default() -> Self {
        Self {
            vibration_min: 1.3,
            vibration_max: 2.0,
            noise_low_warning: 80.0,
            noise_warning: 95.0,
            noise_error: 120.0,
            pm_warning: 900.0,
            pm_error: 1000.0,
            temp_fallback_warning: 40.0,
            temp_fallback_error: 60.0,
        }
    }
}

impl LevelRules {
    pub fn vibration(&self, v: f64) -> StatusLevel {
        if v < self.vibration_min || v > self.vibration_max {
            StatusLevel::Error
        } else {
            StatusLevel::Success
        }
    }

    pub fn noise(&self, n: f64) -> StatusLevel {
        if n >= self.noise_error {
            StatusLevel::Error
        } else if n >= self.noise_warning || n < self.noise_low_warning {
            StatusLevel::Warning
        } else {
            StatusLevel::Success
        }
    }

    pub fn rpm(&self, _rpm: i64) -> StatusLevel {
        StatusLevel::Success
    }

    pub fn pm(&self, pm: f64) -> StatusLevel {
        if pm >= self.pm_error {
            StatusLevel::Error
        } else if pm >= self.pm_warning {
            StatusLevel::Warning
        } else {
            StatusLevel::Success
        }
    }

    pub fn temperature(&self, t: f64, limit: Option<TempLimit>) -> StatusLevel {
        let (warning, error) = match limit {
            Some(l) => (l.low, l.high),
            None => (self.temp_fallback_warning, self.temp_fallback_error),
        };
        if t >= error {
            StatusLevel::Error
        } else if t >= warning {
            StatusLevel::Warning
        } else {
            StatusLevel::Success
        }
    }
}

// ============================================================================
// Status Row
// ============================================================================

/// Keys of the status row items, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    Hot,
    Vibration,
    Noise,
    Rpm,
    Pm,
}

impl StatusKey {
    pub const ALL: [StatusKey; 5] = [
        StatusKey::Hot,
        StatusKey::Vibration,
        StatusKey::Noise,
        StatusKey::Rpm,
        StatusKey::Pm,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatusKey::Hot => "Hot Spot",
            StatusKey::Vibration => "Vibration",
            StatusKey::Noise => "Noise",
            StatusKey::Rpm => "RPM",
            StatusKey::Pm => "Smoke",
        }
    }
}

/// One formatted value with its level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusValue {
    pub text: String,
    pub level: StatusLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusItem {
    pub key: StatusKey,
    pub label: &'static str,
    pub values: Vec<StatusValue>,
}

impl StatusItem {
    /// Worst level among this item's values.
    pub fn level(&self) -> StatusLevel {
        self.values
            .iter()
            .map(|v| v.level)
            .max()
            .unwrap_or(StatusLevel::Success)
    }
}

/// Display-ready status row built from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub items: Vec<StatusItem>,
}

impl StatusRow {
    pub fn build(snapshot: &StatusSnapshot, limits: Option<&HotLimits>, rules: &LevelRules) -> Self {
        Self::build_only(snapshot, limits, rules, &StatusKey::ALL)
    }

    /// Build only the items named in `keys` (display order is preserved).
    pub fn build_only(
        snapshot: &StatusSnapshot,
        limits: Option<&HotLimits>,
        rules: &LevelRules,
        keys: &[StatusKey],
    ) -> Self {
        let items = StatusKey::ALL
            .iter()
            .filter(|k| keys.contains(k))
            .map(|&key| StatusItem {
                key,
                label: key.label(),
                values: Self::values_for(key, snapshot, limits, rules),
            })
            .collect();
        Self { items }
    }

    fn values_for(
        key: StatusKey,
        s: &StatusSnapshot,
        limits: Option<&HotLimits>,
        rules: &LevelRules,
    ) -> Vec<StatusValue> {
        match key {
            StatusKey::Hot => vec![
                StatusValue {
                    text: format!("Engine {:.1} °C", s.hot.engine),
                    level: rules.temperature(s.hot.engine, limits.map(|l| l.engine)),
                },
                StatusValue {
                    text: format!("Hydraulic {:.1} °C", s.hot.hydraulic),
                    level: rules.temperature(s.hot.hydraulic, limits.map(|l| l.hydraulic)),
                },
            ],
            StatusKey::Vibration => vec![StatusValue {
                text: format!("{:.2} m/s²", s.vibration),
                level: rules.vibration(s.vibration),
            }],
            StatusKey::Noise => vec![StatusValue {
                text: format!("{:.2} dB(A)", s.noise),
                level: rules.noise(s.noise),
            }],
            StatusKey::Rpm => vec![StatusValue {
                text: s.rpm.to_string(),
                level: rules.rpm(s.rpm),
            }],
            StatusKey::Pm => vec![StatusValue {
                text: format!("{:.2} ppm", s.pm),
                level: rules.pm(s.pm),
            }],
        }
    }

    /// Worst level across the whole row.
    pub fn overall(&self) -> StatusLevel {
        self.items
            .iter()
            .map(StatusItem::level)
            .max()
            .unwrap_or(StatusLevel::Success)
    }
}

impl std::fmt::Display for StatusRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}:", item.label)?;
            for value in &item.values {
                write!(f, " {} [{}]", value.text, value.level)?;
            }
        }
        Ok(())
    }
}
