//! Status Aggregation Tests
//!
//! Scenario coverage for the pure reduction and the feed backfill it reads
//! from: windowed mean, sparse-window fallback, empty feeds, idempotence.

use std::sync::Arc;

use equipment_dash::clock::{ManualClock, SharedClock};
use equipment_dash::feeds::{make_rng, FeedConfig, FeedGenerator, NoiseWave};
use equipment_dash::status::{aggregate, LevelRules, StatusInputs, StatusLevel, StatusRow};
use equipment_dash::types::{
    vibration_magnitudes, AggregationPolicy, HotSpot, MagnitudeSample, NoiseSample, RpmPmSample,
    StatusSnapshot, VibrationSample,
};

fn magnitudes(values: &[(i64, f64)]) -> Vec<MagnitudeSample> {
    values
        .iter()
        .map(|&(ts, v)| MagnitudeSample {
            ts,
            t: String::new(),
            v,
        })
        .collect()
}

fn noise(values: &[(i64, f64)]) -> Vec<NoiseSample> {
    values
        .iter()
        .map(|&(ts, n)| NoiseSample {
            ts,
            t: String::new(),
            n,
        })
        .collect()
}

fn rpm_pm(values: &[(i64, f64, f64)]) -> Vec<RpmPmSample> {
    values
        .iter()
        .map(|&(ts, rpm, pm)| RpmPmSample {
            ts,
            t: String::new(),
            rpm,
            pm,
        })
        .collect()
}

// ============================================================================
// Windowed Mean
// ============================================================================

#[test]
fn avg_over_full_window_is_arithmetic_mean() {
    // 60 samples at ts 0, 1000, ..., 59000; now = 59000 keeps all of them.
    let series: Vec<(i64, f64)> = (0..60).map(|i| (i * 1_000, i as f64)).collect();
    let rpm_series: Vec<(i64, f64, f64)> = (0..60)
        .map(|i| (i * 1_000, 400.0 + i as f64, 10.0 + i as f64 / 10.0))
        .collect();
    let vib = magnitudes(&series);
    let noi = noise(&series);
    let rp = rpm_pm(&rpm_series);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };

    let snapshot = aggregate(&inputs, &AggregationPolicy::avg(60_000, 3), HotSpot::default(), 59_000)
        .unwrap();

    // mean(0..=59) = 29.5
    assert_eq!(snapshot.vibration, 29.5);
    assert_eq!(snapshot.noise, 29.5);
    assert_eq!(snapshot.rpm, 430); // 429.5 rounds away from zero
    assert_eq!(snapshot.pm, 12.95);
}

#[test]
fn avg_excludes_samples_older_than_window() {
    let series = [(0, 100.0), (30_000, 10.0), (40_000, 20.0), (50_000, 30.0)];
    let vib = magnitudes(&series);
    let noi = noise(&series);
    let rp = rpm_pm(&[(50_000, 500.0, 12.0)]);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };

    let snapshot = aggregate(&inputs, &AggregationPolicy::avg(30_000, 3), HotSpot::default(), 60_000)
        .unwrap();
    assert_eq!(snapshot.noise, 20.0);
    // rpm_pm has a single in-window sample → latest
    assert_eq!(snapshot.rpm, 500);
}

#[test]
fn two_samples_below_minimum_fall_back_to_latest() {
    let series = [(58_000, 10.0), (59_000, 20.0)];
    let vib = magnitudes(&series);
    let noi = noise(&series);
    let rp = rpm_pm(&[(58_000, 100.0, 1.0), (59_000, 200.0, 2.0)]);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };

    let snapshot = aggregate(&inputs, &AggregationPolicy::avg(60_000, 3), HotSpot::default(), 59_000)
        .unwrap();
    assert_eq!(snapshot.vibration, 20.0);
    assert_eq!(snapshot.noise, 20.0);
    assert_eq!(snapshot.rpm, 200);
    assert_eq!(snapshot.pm, 2.0);
}

// ============================================================================
// Latest
// ============================================================================

#[test]
fn latest_vibration_is_rounded_magnitude() {
    let axes = vec![VibrationSample {
        ts: 1_000,
        t: "00:00:01".into(),
        x: 1.5,
        y: 1.2,
        z: 1.7,
    }];
    let vib = vibration_magnitudes(&axes);
    let noi = noise(&[(1_000, 101.234)]);
    let rp = rpm_pm(&[(1_000, 812.49, 14.456)]);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };

    let snapshot = aggregate(&inputs, &AggregationPolicy::latest(), HotSpot::new(42.0, 38.0), 1_000)
        .unwrap();
    // sqrt(1.5² + 1.2² + 1.7²) = sqrt(6.58) ≈ 2.5652
    assert_eq!(snapshot.vibration, 2.57);
    assert_eq!(snapshot.noise, 101.23);
    assert_eq!(snapshot.rpm, 812);
    assert_eq!(snapshot.pm, 14.46);
    assert_eq!(snapshot.hot, HotSpot::new(42.0, 38.0));
}

#[test]
fn hot_seed_passes_through_unrounded() {
    let vib = magnitudes(&[(0, 1.0)]);
    let noi = noise(&[(0, 90.0)]);
    let rp = rpm_pm(&[(0, 500.0, 12.0)]);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };
    let hot = HotSpot::new(41.234_567, 37.891_011);
    let snapshot = aggregate(&inputs, &AggregationPolicy::latest(), hot, 0).unwrap();
    assert_eq!(snapshot.hot, hot);
}

// ============================================================================
// Degenerate Inputs
// ============================================================================

#[test]
fn empty_rpm_pm_feed_skips_tick_without_nan() {
    let vib = magnitudes(&[(0, 1.6)]);
    let noi = noise(&[(0, 99.0)]);
    let rp: Vec<RpmPmSample> = Vec::new();
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };

    let mut current = StatusSnapshot::default();
    for policy in [AggregationPolicy::latest(), AggregationPolicy::avg(60_000, 3)] {
        if let Some(next) = aggregate(&inputs, &policy, HotSpot::default(), 0) {
            current = next;
        }
    }
    assert_eq!(current, StatusSnapshot::default());
    assert!(!current.vibration.is_nan() && !current.pm.is_nan());
}

#[test]
fn aggregation_is_idempotent() {
    let vib = magnitudes(&[(0, 1.3), (1_000, 1.7), (2_000, 1.9)]);
    let noi = noise(&[(0, 99.0), (1_000, 101.0), (2_000, 103.5)]);
    let rp = rpm_pm(&[(0, 450.0, 11.0), (1_000, 650.0, 13.0), (2_000, 850.0, 15.0)]);
    let inputs = StatusInputs {
        vibration: &vib,
        noise: &noi,
        rpm_pm: &rp,
    };
    let policy = AggregationPolicy::avg(60_000, 3);

    let a = aggregate(&inputs, &policy, HotSpot::default(), 2_000);
    let b = aggregate(&inputs, &policy, HotSpot::default(), 2_000);
    assert!(a.is_some());
    assert_eq!(a, b);
}

// ============================================================================
// Backfill feeding the aggregator
// ============================================================================

#[tokio::test]
async fn noise_backfill_has_twenty_evenly_spaced_samples() {
    let now = 1_700_000_000_000;
    let clock: SharedClock = Arc::new(ManualClock::new(now));
    let feed = FeedGenerator::backfilled(
        NoiseWave::default(),
        FeedConfig::new(5_000, 20),
        clock,
        make_rng(Some(11)),
    );
    let samples = feed.reader().snapshot().await;

    assert_eq!(samples.len(), 20);
    assert_eq!(samples[0].ts, now - 19 * 5_000);
    assert_eq!(samples[19].ts, now);
    assert!(samples.windows(2).all(|w| w[1].ts - w[0].ts == 5_000));
    // Envelope: 100 ± 8 plus jitter in [0, 4]
    assert!(samples.iter().all(|s| (92.0..=112.0).contains(&s.n)));
}

#[test]
fn status_row_levels_follow_snapshot() {
    let snapshot = StatusSnapshot {
        hot: HotSpot::new(42.0, 38.0),
        vibration: 1.65,
        noise: 96.0,
        rpm: 700,
        pm: 950.0,
    };
    let row = StatusRow::build(&snapshot, None, &LevelRules::default());
    let levels: Vec<StatusLevel> = row.items.iter().map(|i| i.level()).collect();
    assert_eq!(
        levels,
        vec![
            StatusLevel::Warning, // engine 42 ≥ 40 fallback warning
            StatusLevel::Success,
            StatusLevel::Warning,
            StatusLevel::Success,
            StatusLevel::Warning,
        ]
    );
    assert_eq!(row.overall(), StatusLevel::Warning);
}
