//! Synthetic telemetry feeds
//!
//! Each feed is a [`FeedGenerator`] owning one bounded [`FeedBuffer`], one
//! [`SampleRule`] and, while running, one recurring timer.
//!
//! ## Usage
//!
//! ```ignore
//! let feeds = FeedSet::from_config(&config.feeds, clock, Some(42));
//! let running = feeds.start(&cancel);
//! let readers = running.readers();
//! // ...
//! let feeds = running.stop().await?;
//! ```

pub mod buffer;
pub mod generator;
pub mod rules;

pub use buffer::{FeedBuffer, FeedReader};
pub use generator::{make_rng, FeedConfig, FeedGenerator, RunningFeed};
pub use rules::{NoiseWave, RpmPmWave, SampleRule, Stamp, VibrationWalk};

use crate::clock::{local_hms, SharedClock};
use crate::config::FeedsConfig;
use crate::task::TaskError;
use crate::types::{NoiseSample, RpmPmSample, VibrationSample};
use tokio_util::sync::CancellationToken;

/// Age of the older literal vibration seed sample relative to "now".
const VIBRATION_SEED_AGE_MS: i64 = 40_000;

/// The two literal samples the vibration chart starts from.
pub fn default_vibration_seed(now_ms: i64) -> Vec<VibrationSample> {
    let older = now_ms - VIBRATION_SEED_AGE_MS;
    vec![
        VibrationSample {
            ts: older,
            t: local_hms(older),
            x: 1.5,
            y: 1.2,
            z: 1.7,
        },
        VibrationSample {
            ts: now_ms,
            t: local_hms(now_ms),
            x: 1.25,
            y: 1.65,
            z: 1.7,
        },
    ]
}

// ============================================================================
// Feed Set
// ============================================================================

/// Read handles for the three dashboard feeds.
#[derive(Debug, Clone)]
pub struct FeedReaders {
    pub vibration: FeedReader<VibrationSample>,
    pub noise: FeedReader<NoiseSample>,
    pub rpm_pm: FeedReader<RpmPmSample>,
}

/// The three dashboard feeds, idle.
pub struct FeedSet {
    pub vibration: FeedGenerator<VibrationWalk>,
    pub noise: FeedGenerator<NoiseWave>,
    pub rpm_pm: FeedGenerator<RpmPmWave>,
}

impl FeedSet {
    /// Build all three feeds from configuration.
    ///
    /// With a `seed`, each feed gets its own deterministic RNG stream
    /// (`seed`, `seed + 1`, `seed + 2`).
    pub fn from_config(config: &FeedsConfig, clock: SharedClock, seed: Option<u64>) -> Self {
        let rng_for = |offset: u64| make_rng(seed.map(|s| s.wrapping_add(offset)));
        let walk = &config.vibration.walk;
        let vibration_rule = VibrationWalk::new(walk.step, walk.min, walk.max);

        let vibration = if config.vibration.backfill {
            FeedGenerator::backfilled(vibration_rule, config.vibration.feed(), clock.clone(), rng_for(0))
        } else {
            let seed_samples = default_vibration_seed(clock.now_ms());
            FeedGenerator::seeded(
                vibration_rule,
                config.vibration.feed(),
                clock.clone(),
                rng_for(0),
                seed_samples,
            )
        };

        Self {
            vibration,
            noise: FeedGenerator::backfilled(NoiseWave::default(), config.noise, clock.clone(), rng_for(1)),
            rpm_pm: FeedGenerator::backfilled(RpmPmWave::default(), config.rpm_pm, clock, rng_for(2)),
        }
    }

    pub fn readers(&self) -> FeedReaders {
        FeedReaders {
            vibration: self.vibration.reader(),
            noise: self.noise.reader(),
            rpm_pm: self.rpm_pm.reader(),
        }
    }

    /// Arm all three timers under children of `cancel`.
    pub fn start(self, cancel: &CancellationToken) -> RunningFeeds {
        RunningFeeds {
            vibration: self.vibration.start(cancel.child_token()),
            noise: self.noise.start(cancel.child_token()),
            rpm_pm: self.rpm_pm.start(cancel.child_token()),
        }
    }
}

/// The three dashboard feeds with their timers armed.
pub struct RunningFeeds {
    vibration: RunningFeed<VibrationWalk>,
    noise: RunningFeed<NoiseWave>,
    rpm_pm: RunningFeed<RpmPmWave>,
}

impl RunningFeeds {
    pub fn readers(&self) -> FeedReaders {
        FeedReaders {
            vibration: self.vibration.reader(),
            noise: self.noise.reader(),
            rpm_pm: self.rpm_pm.reader(),
        }
    }

    /// Stop every timer and return the idle feeds.
    pub async fn stop(self) -> Result<FeedSet, TaskError> {
        // Join all three before reporting the first failure.
        let vibration = self.vibration.stop().await;
        let noise = self.noise.stop().await;
        let rpm_pm = self.rpm_pm.stop().await;
        Ok(FeedSet {
            vibration: vibration?,
            noise: noise?,
            rpm_pm: rpm_pm?,
        })
    }
}
