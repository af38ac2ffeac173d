//! Config validation: unknown-key detection with "did you mean?" suggestions
//! and checks for values that are legal but probably not intended.
//!
//! Unknown keys are found by parsing the raw document into `toml::Value`,
//! walking its key tree and comparing each dotted path against the known
//! field names. These are warnings only; serde deserialization and
//! `DashboardConfig::validate` decide what is fatal.

use std::collections::HashSet;

use super::DashboardConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `DashboardConfig`.
///
/// Entries of `[[rotation.sets]]` share the `rotation.sets.*` paths.
/// Keep in sync with dashboard_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [feeds]
        "feeds",
        // [feeds.vibration]
        "feeds.vibration",
        "feeds.vibration.interval_ms",
        "feeds.vibration.max_points",
        "feeds.vibration.backfill",
        "feeds.vibration.walk",
        "feeds.vibration.walk.step",
        "feeds.vibration.walk.min",
        "feeds.vibration.walk.max",
        // [feeds.noise]
        "feeds.noise",
        "feeds.noise.interval_ms",
        "feeds.noise.max_points",
        // [feeds.rpm_pm]
        "feeds.rpm_pm",
        "feeds.rpm_pm.interval_ms",
        "feeds.rpm_pm.max_points",
        // [status]
        "status",
        "status.mode",
        "status.window_ms",
        "status.min_samples_for_avg",
        "status.tick_ms",
        "status.hot_seed",
        "status.hot_seed.engine",
        "status.hot_seed.hydraulic",
        // [levels]
        "levels",
        "levels.vibration_min",
        "levels.vibration_max",
        "levels.noise_low_warning",
        "levels.noise_warning",
        "levels.noise_error",
        "levels.pm_warning",
        "levels.pm_error",
        "levels.temp_fallback_warning",
        "levels.temp_fallback_error",
        // [rotation]
        "rotation",
        "rotation.interval_ms",
        "rotation.sets",
        "rotation.sets.engine_img",
        "rotation.sets.hydraulic_img",
        "rotation.sets.hot",
        "rotation.sets.hot.engine",
        "rotation.sets.hot.hydraulic",
        "rotation.sets.low_limit",
        "rotation.sets.low_limit.engine",
        "rotation.sets.low_limit.hydraulic",
        "rotation.sets.high_limit",
        "rotation.sets.high_limit.engine",
        "rotation.sets.high_limit.hydraulic",
        // top level
        "vehicles",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect the dotted key paths of a `toml::Value` tree.
///
/// `{ a = { b = 1 }, c = [{ d = 2 }] }` yields `["a", "a.b", "c", "c.d"]`.
/// Tables inside arrays are walked under the array's own path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for nested in walk_toml_keys(item, &path) {
                            if !keys.contains(&nested) {
                                keys.push(nested);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any. Ties go to the
/// lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every key in `raw_toml` that the config does not define.
///
/// Never fails: a document that does not parse yields no warnings and is
/// reported by serde instead.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Suspicious Values
// ============================================================================

/// Values that pass `validate()` but are probably mistakes.
pub fn validate_suspicious_values(config: &DashboardConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |field: &str, message: String| {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message,
            suggestion: None,
        });
    };

    let s = &config.status;
    let window = u64::try_from(s.window_ms).unwrap_or(0);
    if window < s.tick_ms {
        warn(
            "status.window_ms",
            format!(
                "status.window_ms ({}) is shorter than status.tick_ms ({}); avg mode will mostly fall back to latest",
                s.window_ms, s.tick_ms
            ),
        );
    }

    let walk = &config.feeds.vibration.walk;
    let l = &config.levels;
    if walk.max < l.vibration_min || walk.min > l.vibration_max {
        warn(
            "feeds.vibration.walk",
            format!(
                "vibration walk range [{:.2}, {:.2}] never reaches the normal band [{:.2}, {:.2}]",
                walk.min, walk.max, l.vibration_min, l.vibration_max
            ),
        );
    }

    for (name, feed) in [
        ("feeds.vibration.interval_ms", config.feeds.vibration.feed()),
        ("feeds.noise.interval_ms", config.feeds.noise),
        ("feeds.rpm_pm.interval_ms", config.feeds.rpm_pm),
    ] {
        if feed.interval_ms > 0 && feed.interval_ms < 100 {
            warn(
                name,
                format!("{name} = {} ms is unusually fast for a dashboard feed", feed.interval_ms),
            );
        }
    }

    if config.vehicles.is_empty() {
        warn("vehicles", "vehicles is empty; vehicle search will never match".to_string());
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("noise", "noise"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("interval_sm", "interval_ms"), 2);
        assert_eq!(levenshtein("max_point", "max_points"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("°C", "C"), 1);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [feeds.vibration.walk]
            step = 0.1
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"feeds".to_string()));
        assert!(keys.contains(&"feeds.vibration".to_string()));
        assert!(keys.contains(&"feeds.vibration.walk.step".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[rotation.sets]]
            engine_img = "a.png"
            [rotation.sets.hot]
            engine = 40.0

            [[rotation.sets]]
            engine_img = "b.png"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"rotation.sets".to_string()));
        assert!(keys.contains(&"rotation.sets.hot.engine".to_string()));
        assert_eq!(
            keys.iter().filter(|k| *k == "rotation.sets.engine_img").count(),
            1
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[feeds.noise]
max_point = 20
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "feeds.noise.max_point");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("feeds.noise.max_points")
        );
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
vehicles = ["A1", "B2"]

[feeds.vibration]
interval_ms = 1000
backfill = true

[status]
mode = "avg"

[status.hot_seed]
engine = 40.0
hydraulic = 35.0

[[rotation.sets]]
engine_img = "e.png"
hydraulic_img = "h.png"
hot = { engine = 40.0, hydraulic = 35.0 }
low_limit = { engine = 50.0, hydraulic = 45.0 }
high_limit = { engine = 70.0, hydraulic = 65.0 }
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys("[thermal]\nengine = 1\n");
        assert!(warnings.iter().any(|w| w.field == "thermal"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_not_suspicious() {
        let warnings = validate_suspicious_values(&DashboardConfig::default());
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_short_window_is_suspicious() {
        let mut config = DashboardConfig::default();
        config.status.window_ms = 100;
        let warnings = validate_suspicious_values(&config);
        assert!(warnings.iter().any(|w| w.field == "status.window_ms"));
    }
}
