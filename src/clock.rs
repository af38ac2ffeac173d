//! Time sources and the `HH:MM:SS` chart label formatter.
//!
//! Every component that stamps or filters samples takes a [`SharedClock`]
//! instead of reading the wall clock directly, so tests and the offline
//! `feed-dump` tool can drive time explicitly.

use chrono::{Local, TimeZone};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Label used when a timestamp cannot be represented in the target zone.
const INVALID_LABEL: &str = "--:--:--";

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Shared, type-erased clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall time anchored once, then advanced by the tokio clock.
///
/// Under `tokio::time::pause()` this clock stands still together with the
/// runtime's timers, which keeps sample timestamps and timer firings in step.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch_ms: i64,
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    /// Anchor at the current wall time.
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.now_ms())
    }

    /// Anchor at an explicit wall time.
    pub fn anchored_at(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

/// Render `ts_ms` as a zero-padded 24h `HH:MM:SS` label in `tz`.
pub fn format_hms<Tz: TimeZone>(ts_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => INVALID_LABEL.to_string(),
    }
}

/// [`format_hms`] in the host's local time zone.
pub fn local_hms(ts_ms: i64) -> String {
    format_hms(ts_ms, &Local)
}
