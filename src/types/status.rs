use serde::{Deserialize, Serialize};

// ============================================================================
// Hot-Spot Seed
// ============================================================================

/// Hot-spot temperatures (°C) for the engine room and hydraulic unit.
///
/// There is no thermal feed; this pair is supplied from outside (config or
/// the active image set) and passed through to the snapshot unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotSpot {
    pub engine: f64,
    pub hydraulic: f64,
}

impl HotSpot {
    pub const fn new(engine: f64, hydraulic: f64) -> Self {
        Self { engine, hydraulic }
    }
}

impl Default for HotSpot {
    fn default() -> Self {
        Self::new(42.0, 38.0)
    }
}

// ============================================================================
// Aggregation Policy
// ============================================================================

/// How the aggregator reduces each feed to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Most recent sample of each feed.
    #[default]
    Latest,
    /// Mean over the sliding window, falling back to latest when sparse.
    Avg,
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMode::Latest => write!(f, "latest"),
            AggregationMode::Avg => write!(f, "avg"),
        }
    }
}

impl std::str::FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(AggregationMode::Latest),
            "avg" | "average" => Ok(AggregationMode::Avg),
            other => Err(format!("unknown aggregation mode '{other}' (expected latest|avg)")),
        }
    }
}

/// Aggregation mode plus the sliding-window parameters used by `Avg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    pub mode: AggregationMode,
    /// Width of the sliding window `[now - window_ms, now]`.
    pub window_ms: i64,
    /// Fewer in-window samples than this → use the latest value instead.
    pub min_samples_for_avg: usize,
}

impl AggregationPolicy {
    pub fn latest() -> Self {
        Self {
            mode: AggregationMode::Latest,
            ..Self::default()
        }
    }

    pub fn avg(window_ms: i64, min_samples_for_avg: usize) -> Self {
        Self {
            mode: AggregationMode::Avg,
            window_ms,
            min_samples_for_avg,
        }
    }
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Latest,
            window_ms: 60_000,
            min_samples_for_avg: 3,
        }
    }
}

// ============================================================================
// Status Snapshot
// ============================================================================

/// Rolled-up status derived from all feeds at one aggregation tick.
///
/// Never a source of truth: recomputed wholesale from the buffers each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub hot: HotSpot,
    /// Vibration magnitude (m/s², 2 dp)
    pub vibration: f64,
    /// Noise level (dB, 2 dp)
    pub noise: f64,
    pub rpm: i64,
    /// Particulate concentration (2 dp)
    pub pm: f64,
}

impl StatusSnapshot {
    /// Zero-valued snapshot carrying only the hot-spot seed.
    pub fn empty(hot: HotSpot) -> Self {
        Self {
            hot,
            vibration: 0.0,
            noise: 0.0,
            rpm: 0,
            pm: 0.0,
        }
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::empty(HotSpot::default())
    }
}
