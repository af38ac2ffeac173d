//! Dashboard Runtime Tests
//!
//! Feeds, aggregator and rotation running together on paused tokio time.
//! Timestamps come from a `MonotonicClock` so sample times and timer firings
//! stay in step.

use std::sync::Arc;
use std::time::Duration;

use equipment_dash::clock::{Clock, MonotonicClock, SharedClock};
use equipment_dash::config::{default_image_sets, DashboardConfig, FeedsConfig};
use equipment_dash::feeds::{FeedConfig, FeedSet};
use equipment_dash::rotation::SetRotation;
use equipment_dash::status::StatusAggregator;
use equipment_dash::types::{AggregationMode, HotSpot};
use tokio_util::sync::CancellationToken;

/// 2024-01-01T00:00:30Z
const START_MS: i64 = 1_704_067_230_000;

fn clock() -> SharedClock {
    Arc::new(MonotonicClock::anchored_at(START_MS))
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn small_feeds() -> FeedsConfig {
    let mut feeds = FeedsConfig::default();
    feeds.vibration.interval_ms = 1_000;
    feeds.vibration.max_points = 5;
    feeds.noise = FeedConfig::new(1_000, 4);
    feeds.rpm_pm = FeedConfig::new(2_000, 6);
    feeds
}

#[tokio::test(start_paused = true)]
async fn buffer_length_is_min_of_capacity_and_history() {
    let feeds = FeedSet::from_config(&small_feeds(), clock(), Some(3));
    let readers = feeds.readers();
    // Vibration starts from the two literal samples; the others are backfilled full.
    assert_eq!(readers.vibration.len().await, 2);
    assert_eq!(readers.noise.len().await, 4);
    assert_eq!(readers.rpm_pm.len().await, 6);

    let cancel = CancellationToken::new();
    let running = feeds.start(&cancel);

    for ticks in 1..=5usize {
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        settle().await;
        assert_eq!(readers.vibration.len().await, (2 + ticks).min(5));
        assert_eq!(readers.noise.len().await, 4);
    }

    let newest = readers.noise.latest().await.unwrap();
    assert_eq!(newest.ts, START_MS + 5_000);

    running.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn vibration_axes_stay_clamped_over_long_runs() {
    let mut config = small_feeds();
    config.vibration.max_points = 500;
    config.vibration.interval_ms = 10;
    let feeds = FeedSet::from_config(&config, clock(), Some(99));
    let readers = feeds.readers();
    let running = feeds.start(&CancellationToken::new());

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    settle().await;
    let samples = readers.vibration.snapshot().await;
    assert!(samples.len() > 400);
    for s in &samples {
        for axis in [s.x, s.y, s.z] {
            assert!((0.8..=2.2).contains(&axis), "axis {axis} out of range");
        }
    }
    assert!(samples.windows(2).all(|w| w[0].ts <= w[1].ts));

    running.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancelling_parent_stops_every_feed() {
    let feeds = FeedSet::from_config(&small_feeds(), clock(), Some(5));
    let readers = feeds.readers();
    let cancel = CancellationToken::new();
    let running = feeds.start(&cancel);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    cancel.cancel();
    settle().await;
    let before = readers.noise.snapshot().await;

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    settle().await;
    assert_eq!(readers.noise.snapshot().await, before, "no ticks after cancellation");

    let idle = running.stop().await.unwrap();
    assert_eq!(idle.noise.reader().len().await, 4);
}

#[tokio::test(start_paused = true)]
async fn aggregator_follows_feeds_and_rotating_hot_seed() {
    let clock = clock();
    let mut config = DashboardConfig::default();
    config.feeds = small_feeds();
    config.status.mode = AggregationMode::Avg;

    let feeds = FeedSet::from_config(&config.feeds, clock.clone(), Some(1));
    let aggregator = StatusAggregator::new(
        config.status.to_status_config(),
        feeds.readers(),
        clock.clone(),
    );
    let cancel = CancellationToken::new();
    let mut rotation = SetRotation::new(default_image_sets(), 60_000, clock.clone())
        .unwrap()
        .with_parent(&cancel);
    rotation.attach_hot_seed(aggregator.hot_seed());

    let feeds = feeds.start(&cancel);
    let aggregator = aggregator.start(cancel.child_token());
    rotation.resume();
    let mut view = aggregator.view();

    assert!(view.changed().await, "first aggregation fires immediately");
    let first = view.current();
    assert!(first.vibration > 0.0 && first.noise > 0.0 && first.pm > 0.0);
    // START_MS sits in minute slot 28_401_120 → 28_401_120 % 3 == 0
    assert_eq!(rotation.current().index, 0);
    assert_eq!(first.hot, HotSpot::new(42.0, 38.0));

    // Cross the minute boundary 30 s later.
    tokio::time::sleep(Duration::from_millis(30_500)).await;
    settle().await;
    assert_eq!(rotation.current().index, 1);
    assert_eq!(view.current().hot, default_image_sets()[1].hot);
    assert!(clock.now_ms() >= START_MS + 30_500);

    rotation.shutdown().await.unwrap();
    let aggregator = aggregator.stop().await.unwrap();
    feeds.stop().await.unwrap();

    let (published, skipped) = aggregator.counters();
    assert_eq!(skipped, 0);
    assert!(published >= 60, "published {published}");
}
