//! Per-tick sample generation rules.
//!
//! Each rule turns the previous sample (if any) and the feed's monotonic
//! tick index into the next sample. Randomness comes from the generator's
//! injected `StdRng`, so seeded runs are reproducible.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};

use crate::types::{NoiseSample, RpmPmSample, Timestamped, VibrationSample};

// ============================================================================
// Constants
// ============================================================================

/// Max per-tick change of each vibration axis (m/s²)
pub const VIBRATION_STEP: f64 = 0.12;
/// Lower clamp for each vibration axis (m/s²)
pub const VIBRATION_MIN: f64 = 0.8;
/// Upper clamp for each vibration axis (m/s²)
pub const VIBRATION_MAX: f64 = 2.2;
/// Walk origin when the buffer holds no previous sample
pub const VIBRATION_START: [f64; 3] = [1.3, 1.5, 1.6];

/// Noise baseline (dB)
pub const NOISE_BASE: f64 = 100.0;
/// Noise oscillation amplitude (dB)
pub const NOISE_AMPLITUDE: f64 = 8.0;
/// Upper bound of the additive noise jitter (dB)
pub const NOISE_JITTER: f64 = 4.0;

pub const RPM_BASE: f64 = 500.0;
pub const RPM_AMPLITUDE: f64 = 400.0;
pub const RPM_JITTER: f64 = 50.0;

pub const PM_BASE: f64 = 12.0;
pub const PM_AMPLITUDE: f64 = 6.0;
pub const PM_JITTER: f64 = 1.5;

/// Shared phase of the sinusoidal feeds: `sin(index / 2)`.
fn wave_phase(index: u64) -> f64 {
    (index as f64 / 2.0).sin()
}

/// `max(min, min(max, value))`; never panics on inverted bounds.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

// ============================================================================
// Rule Trait
// ============================================================================

/// Timestamp and label assigned to a sample by its generator.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub ts: i64,
    pub t: String,
}

/// Generation rule for one feed.
pub trait SampleRule: Send + 'static {
    type Sample: Timestamped + Clone + Send + Sync + std::fmt::Debug + 'static;

    /// Short feed name for logging.
    fn name(&self) -> &'static str;

    /// Produce the next sample.
    ///
    /// `last` is the newest sample currently held (None on an empty buffer);
    /// `index` is the feed's monotonic tick counter.
    fn next(
        &mut self,
        last: Option<&Self::Sample>,
        index: u64,
        stamp: Stamp,
        rng: &mut StdRng,
    ) -> Self::Sample;

    /// Produce a synthetic history sample at `index`.
    ///
    /// Defaults to the live rule so backfilled history looks like live data.
    fn backfill(
        &mut self,
        last: Option<&Self::Sample>,
        index: u64,
        stamp: Stamp,
        rng: &mut StdRng,
    ) -> Self::Sample {
        self.next(last, index, stamp, rng)
    }
}

// ============================================================================
// Vibration: bounded random walk
// ============================================================================

/// Independent clamped random walk on each axis.
#[derive(Debug, Clone)]
pub struct VibrationWalk {
    step: Uniform<f64>,
    min: f64,
    max: f64,
    start: [f64; 3],
}

impl VibrationWalk {
    /// Walk with the given step and clamp bounds.
    ///
    /// A non-finite step falls back to [`VIBRATION_STEP`]; negative steps are
    /// treated as their magnitude.
    pub fn new(step: f64, min: f64, max: f64) -> Self {
        let step = if step.is_finite() { step.abs() } else { VIBRATION_STEP };
        Self {
            step: Uniform::new_inclusive(-step, step),
            min,
            max,
            start: VIBRATION_START,
        }
    }

    pub fn with_start(mut self, start: [f64; 3]) -> Self {
        self.start = start;
        self
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    fn walk(&self, prev: f64, rng: &mut StdRng) -> f64 {
        clamp(prev + self.step.sample(rng), self.min, self.max)
    }
}

impl Default for VibrationWalk {
    fn default() -> Self {
        Self::new(VIBRATION_STEP, VIBRATION_MIN, VIBRATION_MAX)
    }
}

impl SampleRule for VibrationWalk {
    type Sample = VibrationSample;

    fn name(&self) -> &'static str {
        "vibration"
    }

    fn next(
        &mut self,
        last: Option<&VibrationSample>,
        _index: u64,
        stamp: Stamp,
        rng: &mut StdRng,
    ) -> VibrationSample {
        let [x, y, z] = last.map_or(self.start, |s| [s.x, s.y, s.z]);
        VibrationSample {
            ts: stamp.ts,
            t: stamp.t,
            x: self.walk(x, rng),
            y: self.walk(y, rng),
            z: self.walk(z, rng),
        }
    }
}

// ============================================================================
// Noise: sinusoid plus jitter
// ============================================================================

/// `n = 100 + 8·sin(index/2) + U(0, 4)`, unclamped.
#[derive(Debug, Clone)]
pub struct NoiseWave {
    jitter: Uniform<f64>,
}

impl Default for NoiseWave {
    fn default() -> Self {
        Self {
            jitter: Uniform::new(0.0, NOISE_JITTER),
        }
    }
}

impl SampleRule for NoiseWave {
    type Sample = NoiseSample;

    fn name(&self) -> &'static str {
        "noise"
    }

    fn next(
        &mut self,
        _last: Option<&NoiseSample>,
        index: u64,
        stamp: Stamp,
        rng: &mut StdRng,
    ) -> NoiseSample {
        NoiseSample {
            ts: stamp.ts,
            t: stamp.t,
            n: NOISE_BASE + NOISE_AMPLITUDE * wave_phase(index) + self.jitter.sample(rng),
        }
    }
}

// ============================================================================
// RPM / particulate: phase-locked sinusoids
// ============================================================================

/// RPM and particulate driven by the same phase so they rise and fall together.
#[derive(Debug, Clone)]
pub struct RpmPmWave {
    rpm_jitter: Uniform<f64>,
    pm_jitter: Uniform<f64>,
}

impl Default for RpmPmWave {
    fn default() -> Self {
        Self {
            rpm_jitter: Uniform::new(0.0, RPM_JITTER),
            pm_jitter: Uniform::new(0.0, PM_JITTER),
        }
    }
}

impl SampleRule for RpmPmWave {
    type Sample = RpmPmSample;

    fn name(&self) -> &'static str {
        "rpm_pm"
    }

    fn next(
        &mut self,
        _last: Option<&RpmPmSample>,
        index: u64,
        stamp: Stamp,
        rng: &mut StdRng,
    ) -> RpmPmSample {
        let phase = wave_phase(index);
        RpmPmSample {
            ts: stamp.ts,
            t: stamp.t,
            rpm: RPM_BASE + RPM_AMPLITUDE * phase + self.rpm_jitter.sample(rng),
            pm: PM_BASE + PM_AMPLITUDE * phase + self.pm_jitter.sample(rng),
        }
    }
}
