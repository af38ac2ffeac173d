//! Status aggregator runtime: reads the three feeds on its own timer and
//! publishes one snapshot per tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::aggregate::{aggregate, StatusInputs};
use crate::clock::SharedClock;
use crate::feeds::FeedReaders;
use crate::task::{TaskError, TaskHandle};
use crate::types::{vibration_magnitudes, AggregationPolicy, HotSpot, StatusSnapshot};

/// Aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatusConfig {
    pub policy: AggregationPolicy,
    pub hot_seed: HotSpot,
    pub tick_ms: u64,
}

impl StatusConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            policy: AggregationPolicy::default(),
            hot_seed: HotSpot::default(),
            tick_ms: 500,
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Writer side of the hot-spot seed.
///
/// Changes are visible through [`StatusView::current`] immediately, without
/// waiting for the next aggregation tick.
#[derive(Debug, Clone)]
pub struct HotSeed {
    tx: Arc<watch::Sender<HotSpot>>,
}

impl HotSeed {
    pub(crate) fn from_sender(tx: Arc<watch::Sender<HotSpot>>) -> Self {
        Self { tx }
    }

    pub fn set(&self, hot: HotSpot) {
        self.tx.send_replace(hot);
    }

    pub fn get(&self) -> HotSpot {
        *self.tx.borrow()
    }
}

/// Read side of the aggregator output.
#[derive(Debug, Clone)]
pub struct StatusView {
    snapshot: watch::Receiver<StatusSnapshot>,
    hot: watch::Receiver<HotSpot>,
}

impl StatusView {
    /// Last published snapshot with `hot` taken from the current seed.
    pub fn current(&self) -> StatusSnapshot {
        let mut snapshot = *self.snapshot.borrow();
        snapshot.hot = *self.hot.borrow();
        snapshot
    }

    /// Wait for the next published snapshot. Returns false once the
    /// aggregator has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Reduces the three feed buffers to a [`StatusSnapshot`] every `tick_ms`.
pub struct StatusAggregator {
    config: StatusConfig,
    feeds: FeedReaders,
    clock: SharedClock,
    snapshot_tx: watch::Sender<StatusSnapshot>,
    hot_tx: Arc<watch::Sender<HotSpot>>,
    published: u64,
    skipped: u64,
}

impl StatusAggregator {
    pub fn new(config: StatusConfig, feeds: FeedReaders, clock: SharedClock) -> Self {
        let (snapshot_tx, _) = watch::channel(StatusSnapshot::empty(config.hot_seed));
        let (hot_tx, _) = watch::channel(config.hot_seed);
        Self {
            config,
            feeds,
            clock,
            snapshot_tx,
            hot_tx: Arc::new(hot_tx),
            published: 0,
            skipped: 0,
        }
    }

    pub fn config(&self) -> &StatusConfig {
        &self.config
    }

    pub fn set_policy(&mut self, policy: AggregationPolicy) {
        self.config.policy = policy;
    }

    pub fn hot_seed(&self) -> HotSeed {
        HotSeed::from_sender(Arc::clone(&self.hot_tx))
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            snapshot: self.snapshot_tx.subscribe(),
            hot: self.hot_tx.subscribe(),
        }
    }

    /// Number of snapshots published and ticks skipped so far.
    pub fn counters(&self) -> (u64, u64) {
        (self.published, self.skipped)
    }

    /// Run one aggregation tick now.
    ///
    /// Returns the new snapshot, or `None` when a feed was empty and the
    /// previous snapshot was kept.
    pub async fn refresh(&mut self) -> Option<StatusSnapshot> {
        let now = self.clock.now_ms();
        let vibration = vibration_magnitudes(&self.feeds.vibration.snapshot().await);
        let noise = self.feeds.noise.snapshot().await;
        let rpm_pm = self.feeds.rpm_pm.snapshot().await;
        let inputs = StatusInputs {
            vibration: &vibration,
            noise: &noise,
            rpm_pm: &rpm_pm,
        };

        let hot = *self.hot_tx.borrow();
        match aggregate(&inputs, &self.config.policy, hot, now) {
            Some(snapshot) => {
                self.snapshot_tx.send_replace(snapshot);
                self.published += 1;
                debug!(
                    mode = %self.config.policy.mode,
                    vibration = snapshot.vibration,
                    noise = snapshot.noise,
                    rpm = snapshot.rpm,
                    pm = snapshot.pm,
                    "Status snapshot published"
                );
                Some(snapshot)
            }
            None => {
                self.skipped += 1;
                debug!(
                    vibration = vibration.len(),
                    noise = noise.len(),
                    rpm_pm = rpm_pm.len(),
                    "Empty feed, keeping previous status"
                );
                None
            }
        }
    }

    /// Fire once immediately, then every `tick_ms`.
    pub fn start(self, cancel: CancellationToken) -> RunningAggregator {
        let view = self.view();
        let hot = self.hot_seed();
        info!(
            mode = %self.config.policy.mode,
            tick_ms = self.config.tick_ms,
            window_ms = self.config.policy.window_ms,
            min_samples = self.config.policy.min_samples_for_avg,
            "Status aggregator started"
        );
        let task = TaskHandle::spawn("status", cancel, move |token| self.run(token));
        RunningAggregator { task, view, hot }
    }

    async fn run(mut self, cancel: CancellationToken) -> Self {
        let mut interval = tokio::time::interval(self.config.tick());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.refresh().await;
                }
            }
        }

        info!(
            published = self.published,
            skipped = self.skipped,
            "Status aggregator stopped"
        );
        self
    }
}

/// An aggregator whose timer is armed.
pub struct RunningAggregator {
    task: TaskHandle<StatusAggregator>,
    view: StatusView,
    hot: HotSeed,
}

impl RunningAggregator {
    pub fn view(&self) -> StatusView {
        self.view.clone()
    }

    pub fn hot_seed(&self) -> HotSeed {
        self.hot.clone()
    }

    pub async fn stop(self) -> Result<StatusAggregator, TaskError> {
        self.task.stop().await
    }
}
