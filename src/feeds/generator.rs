//! Feed generator: owns one buffer, one rule, one RNG and (while running) one timer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::buffer::{FeedBuffer, FeedReader};
use super::rules::{SampleRule, Stamp};
use crate::clock::{local_hms, SharedClock};
use crate::task::{TaskError, TaskHandle};
use crate::types::Timestamped;

// ============================================================================
// Configuration
// ============================================================================

/// Timer interval and buffer capacity of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub interval_ms: u64,
    pub max_points: usize,
}

impl FeedConfig {
    pub const fn new(interval_ms: u64, max_points: usize) -> Self {
        Self {
            interval_ms,
            max_points,
        }
    }

    /// Tick period; a zero interval is raised to 1 ms.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(5_000, 20)
    }
}

/// Build the generator RNG: seeded when `seed` is given, OS entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// ============================================================================
// Generator
// ============================================================================

/// One synthetic feed.
///
/// Created with history already in place ([`backfilled`](Self::backfilled) or
/// [`seeded`](Self::seeded)), advanced with [`tick`](Self::tick), and driven
/// by its own timer between [`start`](Self::start) and
/// [`RunningFeed::stop`].
pub struct FeedGenerator<R: SampleRule> {
    rule: R,
    config: FeedConfig,
    clock: SharedClock,
    rng: StdRng,
    buffer: Arc<RwLock<FeedBuffer<R::Sample>>>,
    /// Monotonic index handed to the rule; never decreases on eviction.
    next_index: u64,
}

impl<R: SampleRule> FeedGenerator<R> {
    /// Create a feed whose history is `max_points` synthetic samples spaced
    /// `interval_ms` apart and ending at the clock's "now".
    pub fn backfilled(mut rule: R, config: FeedConfig, clock: SharedClock, mut rng: StdRng) -> Self {
        let count = config.max_points.max(1);
        let now = clock.now_ms();
        let step = i64::try_from(config.interval().as_millis()).unwrap_or(i64::MAX);
        let mut buffer = FeedBuffer::new(count);

        for i in 0..count {
            let back = i64::try_from(count - 1 - i).unwrap_or(i64::MAX);
            let ts = now.saturating_sub(back.saturating_mul(step));
            let stamp = Stamp {
                ts,
                t: local_hms(ts),
            };
            let sample = rule.backfill(buffer.latest(), i as u64, stamp, &mut rng);
            buffer.push(sample);
        }

        debug!(feed = rule.name(), samples = count, "Feed backfilled");
        Self::assemble(rule, config, clock, rng, buffer, count as u64)
    }

    /// Create a feed starting from literal seed samples (newest `max_points` kept).
    pub fn seeded(
        rule: R,
        config: FeedConfig,
        clock: SharedClock,
        rng: StdRng,
        seed: Vec<R::Sample>,
    ) -> Self {
        let seed_len = seed.len() as u64;
        let buffer = FeedBuffer::from_samples(config.max_points, seed);
        debug!(feed = rule.name(), samples = buffer.len(), "Feed seeded");
        Self::assemble(rule, config, clock, rng, buffer, seed_len)
    }

    fn assemble(
        rule: R,
        config: FeedConfig,
        clock: SharedClock,
        rng: StdRng,
        buffer: FeedBuffer<R::Sample>,
        next_index: u64,
    ) -> Self {
        Self {
            rule,
            config,
            clock,
            rng,
            buffer: Arc::new(RwLock::new(buffer)),
            next_index,
        }
    }

    pub fn name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn config(&self) -> FeedConfig {
        self.config
    }

    /// Read-only handle onto this feed's buffer.
    pub fn reader(&self) -> FeedReader<R::Sample> {
        FeedReader::new(Arc::clone(&self.buffer))
    }

    /// Append exactly one sample stamped with the clock's "now".
    pub async fn tick(&mut self) -> R::Sample {
        let ts = self.clock.now_ms();
        let stamp = Stamp {
            ts,
            t: local_hms(ts),
        };
        let index = self.next_index;
        self.next_index += 1;

        let mut buffer = self.buffer.write().await;
        let sample = self.rule.next(buffer.latest(), index, stamp, &mut self.rng);
        buffer.push(sample.clone());
        trace!(
            feed = self.rule.name(),
            index,
            ts = sample.ts(),
            len = buffer.len(),
            "Feed tick"
        );
        sample
    }

    /// Arm the recurring timer. The first sample lands one interval from now.
    pub fn start(self, cancel: CancellationToken) -> RunningFeed<R> {
        let name = self.rule.name();
        let reader = self.reader();
        info!(
            feed = name,
            interval_ms = self.config.interval_ms,
            max_points = self.config.max_points,
            "Feed started"
        );
        let task = TaskHandle::spawn(name, cancel, move |token| self.run(token));
        RunningFeed { task, reader }
    }

    async fn run(mut self, cancel: CancellationToken) -> Self {
        let period = self.config.interval();
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!(feed = self.rule.name(), ticks = self.next_index, "Feed stopped");
        self
    }
}

// ============================================================================
// Running Feed
// ============================================================================

/// A feed whose timer is armed.
pub struct RunningFeed<R: SampleRule> {
    task: TaskHandle<FeedGenerator<R>>,
    reader: FeedReader<R::Sample>,
}

impl<R: SampleRule> RunningFeed<R> {
    pub fn name(&self) -> &'static str {
        self.task.name()
    }

    pub fn reader(&self) -> FeedReader<R::Sample> {
        self.reader.clone()
    }

    /// Clear the timer and take the generator back (its buffer intact).
    pub async fn stop(self) -> Result<FeedGenerator<R>, TaskError> {
        self.task.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feeds::rules::{NoiseWave, RpmPmWave, VibrationWalk};
    use crate::types::VibrationSample;

    fn manual(now: i64) -> (Arc<ManualClock>, SharedClock) {
        let clock = Arc::new(ManualClock::new(now));
        let shared: SharedClock = clock.clone();
        (clock, shared)
    }

    #[tokio::test]
    async fn backfill_fills_capacity_with_even_spacing() {
        let (_, clock) = manual(1_000_000);
        let feed = FeedGenerator::backfilled(
            NoiseWave::default(),
            FeedConfig::new(5_000, 20),
            clock,
            make_rng(Some(1)),
        );
        let samples = feed.reader().snapshot().await;
        assert_eq!(samples.len(), 20);
        assert_eq!(samples.last().map(|s| s.ts), Some(1_000_000));
        for pair in samples.windows(2) {
            assert_eq!(pair[1].ts - pair[0].ts, 5_000);
        }
    }

    #[tokio::test]
    async fn tick_appends_and_evicts() {
        let (clock, shared) = manual(0);
        let mut feed = FeedGenerator::backfilled(
            RpmPmWave::default(),
            FeedConfig::new(1_000, 3),
            shared,
            make_rng(Some(2)),
        );
        let reader = feed.reader();
        let before = reader.snapshot().await;

        clock.set(1_000);
        let added = feed.tick().await;
        let after = reader.snapshot().await;

        assert_eq!(after.len(), 3);
        assert_eq!(after.last(), Some(&added));
        assert_eq!(after[0], before[1]);
        assert_eq!(added.ts, 1_000);
    }

    #[tokio::test]
    async fn index_keeps_counting_after_buffer_fills() {
        let (_, shared) = manual(0);
        let mut feed = FeedGenerator::backfilled(
            NoiseWave::default(),
            FeedConfig::new(1_000, 4),
            shared,
            make_rng(Some(3)),
        );
        for _ in 0..10 {
            feed.tick().await;
        }
        assert_eq!(feed.next_index, 14);
        assert_eq!(feed.reader().len().await, 4);
    }

    #[tokio::test]
    async fn seeded_feed_grows_to_capacity() {
        let (_, shared) = manual(50_000);
        let seed = vec![
            VibrationSample { ts: 10_000, t: "16:30".into(), x: 1.5, y: 1.2, z: 1.7 },
            VibrationSample { ts: 50_000, t: "17:10".into(), x: 1.25, y: 1.65, z: 1.7 },
        ];
        let mut feed = FeedGenerator::seeded(
            VibrationWalk::default(),
            FeedConfig::new(2_000, 5),
            shared,
            make_rng(Some(4)),
            seed,
        );
        let reader = feed.reader();
        for ticks in 1..=8usize {
            feed.tick().await;
            assert_eq!(reader.len().await, (2 + ticks).min(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_once_per_interval_and_stops_cleanly() {
        let (_, shared) = manual(0);
        let feed = FeedGenerator::seeded(
            NoiseWave::default(),
            FeedConfig::new(1_000, 50),
            shared,
            make_rng(Some(5)),
            Vec::new(),
        );
        let running = feed.start(CancellationToken::new());
        let reader = running.reader();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(reader.len().await, 0, "first tick must wait a full interval");

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(reader.len().await, 3);

        let feed = running.stop().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(reader.len().await, 3, "no ticks after stop");
        assert_eq!(feed.reader().len().await, 3);
    }
}
