//! Pure status reduction: buffers + policy + seed + "now" → snapshot.

use crate::types::{
    AggregationMode, AggregationPolicy, HotSpot, MagnitudeSample, NoiseSample, RpmPmSample,
    StatusSnapshot, Timestamped,
};

/// Borrowed view of the three feed series, oldest sample first.
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub vibration: &'a [MagnitudeSample],
    pub noise: &'a [NoiseSample],
    pub rpm_pm: &'a [RpmPmSample],
}

impl StatusInputs<'_> {
    /// True when any series is empty; such ticks are skipped.
    pub fn any_empty(&self) -> bool {
        self.vibration.is_empty() || self.noise.is_empty() || self.rpm_pm.is_empty()
    }
}

/// Mean of one field over the sliding window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMean {
    pub mean: f64,
    pub count: usize,
}

/// Mean of `field` over samples with `ts >= now_ms - window_ms`.
///
/// Returns `None` when no sample falls inside the window.
pub fn window_mean<S, F>(samples: &[S], now_ms: i64, window_ms: i64, field: F) -> Option<WindowMean>
where
    S: Timestamped,
    F: Fn(&S) -> f64,
{
    let cutoff = now_ms.saturating_sub(window_ms);
    let (sum, count) = samples
        .iter()
        .filter(|s| s.ts() >= cutoff)
        .fold((0.0, 0usize), |(sum, count), s| (sum + field(s), count + 1));

    if count == 0 {
        return None;
    }
    Some(WindowMean {
        mean: sum / count as f64,
        count,
    })
}

/// Reduce one series to a single value under `policy`.
///
/// `Avg` uses the window mean when at least `min_samples_for_avg` samples are
/// inside the window and the latest value otherwise. An empty series yields 0.
pub fn reduce_metric<S, F>(samples: &[S], policy: &AggregationPolicy, now_ms: i64, field: F) -> f64
where
    S: Timestamped,
    F: Fn(&S) -> f64,
{
    let latest = samples.last().map_or(0.0, &field);
    match policy.mode {
        AggregationMode::Latest => latest,
        AggregationMode::Avg => match window_mean(samples, now_ms, policy.window_ms, &field) {
            Some(w) if w.count >= policy.min_samples_for_avg => w.mean,
            _ => latest,
        },
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to the nearest integer; non-finite values become 0.
pub fn round0(x: f64) -> i64 {
    if x.is_finite() {
        // Saturating float→int cast.
        x.round() as i64
    } else {
        0
    }
}

/// Compute one snapshot, or `None` when any input series is empty.
///
/// Deterministic in its arguments; the caller keeps its previous snapshot on `None`.
pub fn aggregate(
    inputs: &StatusInputs<'_>,
    policy: &AggregationPolicy,
    hot: HotSpot,
    now_ms: i64,
) -> Option<StatusSnapshot> {
    if inputs.any_empty() {
        return None;
    }

    let vibration = reduce_metric(inputs.vibration, policy, now_ms, |s| s.v);
    let noise = reduce_metric(inputs.noise, policy, now_ms, |s| s.n);
    let rpm = reduce_metric(inputs.rpm_pm, policy, now_ms, |s| s.rpm);
    let pm = reduce_metric(inputs.rpm_pm, policy, now_ms, |s| s.pm);

    Some(StatusSnapshot {
        hot,
        vibration: round2(vibration),
        noise: round2(noise),
        rpm: round0(rpm),
        pm: round2(pm),
    })
}
