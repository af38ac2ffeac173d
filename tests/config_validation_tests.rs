//! Config Validation Tests
//!
//! Exercise the dashboard config layer end to end: loading from disk,
//! typo detection and consistency checks.

use std::io::Write;

use equipment_dash::config::validation::{
    known_config_keys, suggest_correction, validate_unknown_keys,
};
use equipment_dash::config::{ConfigError, DashboardConfig};
use equipment_dash::types::AggregationMode;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn full_config_loads_from_file() {
    let file = write_config(
        r#"
vehicles = ["VIN-A", "VIN-B"]

[feeds.vibration]
interval_ms = 1000
max_points = 40
backfill = true

[feeds.vibration.walk]
step = 0.05
min = 1.0
max = 2.0

[feeds.noise]
interval_ms = 2500
max_points = 25

[feeds.rpm_pm]
interval_ms = 3000
max_points = 60

[status]
mode = "avg"
window_ms = 30000
min_samples_for_avg = 5
tick_ms = 250

[status.hot_seed]
engine = 45.0
hydraulic = 40.0

[levels]
noise_warning = 90.0
noise_error = 110.0

[rotation]
interval_ms = 30000

[[rotation.sets]]
engine_img = "e1.png"
hydraulic_img = "h1.png"
hot = { engine = 40.0, hydraulic = 35.0 }
low_limit = { engine = 50.0, hydraulic = 45.0 }
high_limit = { engine = 70.0, hydraulic = 65.0 }
"#,
    );

    let config = DashboardConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.vehicles, vec!["VIN-A", "VIN-B"]);
    assert_eq!(config.feeds.vibration.interval_ms, 1000);
    assert!(config.feeds.vibration.backfill);
    assert_eq!(config.feeds.vibration.walk.step, 0.05);
    assert_eq!(config.feeds.rpm_pm.max_points, 60);

    let status = config.status.to_status_config();
    assert_eq!(status.policy.mode, AggregationMode::Avg);
    assert_eq!(status.policy.window_ms, 30_000);
    assert_eq!(status.policy.min_samples_for_avg, 5);
    assert_eq!(status.tick_ms, 250);
    assert_eq!(status.hot_seed.engine, 45.0);

    assert_eq!(config.levels.noise_warning, 90.0);
    assert_eq!(config.levels.pm_error, 1000.0, "untouched level keeps default");
    assert_eq!(config.rotation.interval_ms, 30_000);
    assert_eq!(config.rotation.sets.len(), 1);
    assert_eq!(config.rotation.sets[0].limits().hydraulic.high, 65.0);
}

#[test]
fn missing_file_is_io_error() {
    let err = DashboardConfig::load_from_file(std::path::Path::new("/nonexistent/dashboard.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn malformed_toml_is_parse_error_with_path() {
    let file = write_config("[status\nmode = ");
    let err = DashboardConfig::load_from_file(file.path()).unwrap_err();
    match &err {
        ConfigError::Parse(path, _) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn unknown_mode_is_parse_error() {
    let file = write_config("[status]\nmode = \"median\"\n");
    assert!(matches!(
        DashboardConfig::load_from_file(file.path()),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn invalid_values_fail_validation_with_every_problem_listed() {
    let file = write_config(
        r#"
[feeds.vibration]
interval_ms = 0

[feeds.vibration.walk]
min = 2.5
max = 1.0

[levels]
pm_warning = 1200.0
pm_error = 1000.0

[rotation]
interval_ms = 60000
sets = []
"#,
    );
    match DashboardConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 4, "{errors:#?}");
            assert!(errors.iter().any(|e| e.contains("feeds.vibration.interval_ms")));
            assert!(errors.iter().any(|e| e.contains("feeds.vibration.walk")));
            assert!(errors.iter().any(|e| e.contains("levels.pm")));
            assert!(errors.iter().any(|e| e.contains("rotation.sets")));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn env_var_takes_precedence_over_defaults() {
    let file = write_config("[status]\ntick_ms = 750\n");
    std::env::set_var("EQUIP_DASH_CONFIG", file.path());
    let config = DashboardConfig::load();
    std::env::remove_var("EQUIP_DASH_CONFIG");
    assert_eq!(config.status.tick_ms, 750);
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_status_section_warns_with_suggestion() {
    let toml_str = r#"
[status]
windw_ms = 30000
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "status.windw_ms");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("status.window_ms"));
}

#[test]
fn typo_inside_image_set_warns() {
    let toml_str = r#"
[[rotation.sets]]
engine_image = "e.png"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("rotation.sets.engine_img")
    );
}

#[test]
fn typo_does_not_prevent_loading() {
    let file = write_config("[feeds.noise]\nmax_pionts = 5\n");
    let config = DashboardConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.feeds.noise.max_points, 20, "typo'd key is ignored");
}

#[test]
fn default_config_round_trips_without_warnings() {
    let text = DashboardConfig::default().to_toml().unwrap();
    let warnings = validate_unknown_keys(&text);
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn known_keys_cover_every_section() {
    let known = known_config_keys();
    for section in ["feeds", "status", "levels", "rotation", "vehicles"] {
        assert!(known.contains(section), "missing {section}");
    }
    assert!(suggest_correction("levels.noise_eror", &known).is_some());
}
