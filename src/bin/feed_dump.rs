//! Feed Dump
//!
//! Generates dashboard feed data offline and deterministically: a manual
//! clock is stepped through each feed's timer schedule instead of waiting
//! on real timers. Useful for fixtures, plotting and checking the status
//! aggregation by hand.
//!
//! Output is the initial history of each selected feed followed by every
//! tick's sample in time order, then the final status snapshot under both
//! the `latest` and the `avg` policy.
//!
//! # Usage
//! ```bash
//! ./feed-dump --seed 42 --ticks 30 --feed noise --format csv
//! ./feed-dump --seed 7 --ticks 100 | jq 'select(.feed == "snapshot")'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use equipment_dash::clock::{Clock, ManualClock, SharedClock};
use equipment_dash::config::DashboardConfig;
use equipment_dash::feeds::{FeedReaders, FeedSet};
use equipment_dash::status::{aggregate, StatusInputs};
use equipment_dash::types::{
    vibration_magnitudes, AggregationMode, AggregationPolicy, HotSpot, NoiseSample, RpmPmSample,
    StatusSnapshot, VibrationSample,
};

/// Default start time: 2024-01-01T00:00:00Z.
const DEFAULT_START_MS: i64 = 1_704_067_200_000;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FeedChoice {
    Vibration,
    Noise,
    RpmPm,
    All,
}

impl FeedChoice {
    fn includes(self, feed: FeedChoice) -> bool {
        self == FeedChoice::All || self == feed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "feed-dump")]
#[command(about = "Deterministic offline generation of dashboard feed data")]
#[command(version)]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Timer firings per feed
    #[arg(short, long, default_value_t = 30)]
    ticks: u32,

    /// Feed(s) to print
    #[arg(short, long, value_enum, default_value = "all")]
    feed: FeedChoice,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Clock start in ms since the Unix epoch
    #[arg(long, default_value_t = DEFAULT_START_MS)]
    start_ms: i64,

    /// TOML config for feed timers and the avg policy (defaults otherwise)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// Output Records
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "feed", rename_all = "snake_case")]
enum Record<'a> {
    Vibration(&'a VibrationSample),
    Noise(&'a NoiseSample),
    RpmPm(&'a RpmPmSample),
    Snapshot {
        policy: AggregationMode,
        ts: i64,
        snapshot: StatusSnapshot,
    },
}

const CSV_HEADER: &str = "feed,ts,t,x,y,z,n,rpm,pm";
const CSV_SNAPSHOT_HEADER: &str = "policy,ts,engine,hydraulic,vibration,noise,rpm,pm";

fn write_record(out: &mut impl Write, format: Format, record: &Record<'_>) -> Result<()> {
    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string(record)?)?,
        Format::Csv => match record {
            Record::Vibration(s) => {
                writeln!(out, "vibration,{},{},{:.4},{:.4},{:.4},,,", s.ts, s.t, s.x, s.y, s.z)?;
            }
            Record::Noise(s) => writeln!(out, "noise,{},{},,,,{:.4},,", s.ts, s.t, s.n)?,
            Record::RpmPm(s) => {
                writeln!(out, "rpm_pm,{},{},,,,,{:.4},{:.4}", s.ts, s.t, s.rpm, s.pm)?;
            }
            Record::Snapshot { policy, ts, snapshot } => writeln!(
                out,
                "{},{},{:.1},{:.1},{:.2},{:.2},{},{:.2}",
                policy,
                ts,
                snapshot.hot.engine,
                snapshot.hot.hydraulic,
                snapshot.vibration,
                snapshot.noise,
                snapshot.rpm,
                snapshot.pm
            )?,
        },
    }
    Ok(())
}

// ============================================================================
// Schedule
// ============================================================================

/// Time-ordered firings of all three feed timers: `(due_ms, feed)`.
///
/// Firings due at the same instant keep vibration → noise → rpm/pm order.
fn schedule(feeds: &FeedSet, start_ms: i64, ticks: u32) -> Vec<(i64, FeedChoice)> {
    let timers = [
        (FeedChoice::Vibration, feeds.vibration.config().interval()),
        (FeedChoice::Noise, feeds.noise.config().interval()),
        (FeedChoice::RpmPm, feeds.rpm_pm.config().interval()),
    ];
    let mut events: Vec<(i64, usize, FeedChoice)> = timers
        .iter()
        .enumerate()
        .flat_map(|(order, &(feed, interval))| {
            let step = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
            (1..=i64::from(ticks))
                .map(move |n| (start_ms.saturating_add(n.saturating_mul(step)), order, feed))
        })
        .collect();
    events.sort_by_key(|&(due, order, _)| (due, order));
    events.into_iter().map(|(due, _, feed)| (due, feed)).collect()
}

async fn final_snapshot(
    readers: &FeedReaders,
    policy: &AggregationPolicy,
    hot: HotSpot,
    now_ms: i64,
) -> Option<StatusSnapshot> {
    let vibration = vibration_magnitudes(&readers.vibration.snapshot().await);
    let noise = readers.noise.snapshot().await;
    let rpm_pm = readers.rpm_pm.snapshot().await;
    let inputs = StatusInputs {
        vibration: &vibration,
        noise: &noise,
        rpm_pm: &rpm_pm,
    };
    aggregate(&inputs, policy, hot, now_ms)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    let manual = Arc::new(ManualClock::new(args.start_ms));
    let clock: SharedClock = manual.clone();
    let mut feeds = FeedSet::from_config(&config.feeds, clock, Some(args.seed));
    let readers = feeds.readers();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.format == Format::Csv {
        writeln!(out, "{CSV_HEADER}")?;
    }

    // Initial history
    if args.feed.includes(FeedChoice::Vibration) {
        for s in &readers.vibration.snapshot().await {
            write_record(&mut out, args.format, &Record::Vibration(s))?;
        }
    }
    if args.feed.includes(FeedChoice::Noise) {
        for s in &readers.noise.snapshot().await {
            write_record(&mut out, args.format, &Record::Noise(s))?;
        }
    }
    if args.feed.includes(FeedChoice::RpmPm) {
        for s in &readers.rpm_pm.snapshot().await {
            write_record(&mut out, args.format, &Record::RpmPm(s))?;
        }
    }

    // Timer firings; every feed runs so the snapshot sees all three.
    for (due, feed) in schedule(&feeds, args.start_ms, args.ticks) {
        manual.set(due);
        match feed {
            FeedChoice::Vibration => {
                let s = feeds.vibration.tick().await;
                if args.feed.includes(feed) {
                    write_record(&mut out, args.format, &Record::Vibration(&s))?;
                }
            }
            FeedChoice::Noise => {
                let s = feeds.noise.tick().await;
                if args.feed.includes(feed) {
                    write_record(&mut out, args.format, &Record::Noise(&s))?;
                }
            }
            FeedChoice::RpmPm => {
                let s = feeds.rpm_pm.tick().await;
                if args.feed.includes(feed) {
                    write_record(&mut out, args.format, &Record::RpmPm(&s))?;
                }
            }
            FeedChoice::All => {}
        }
    }

    // Final status under both policies
    if args.format == Format::Csv {
        writeln!(out, "{CSV_SNAPSHOT_HEADER}")?;
    }
    let now = manual.now_ms();
    let avg = AggregationPolicy {
        mode: AggregationMode::Avg,
        ..config.status.policy()
    };
    for policy in [AggregationPolicy::latest(), avg] {
        match final_snapshot(&readers, &policy, config.status.hot_seed, now).await {
            Some(snapshot) => write_record(
                &mut out,
                args.format,
                &Record::Snapshot {
                    policy: policy.mode,
                    ts: now,
                    snapshot,
                },
            )?,
            None => eprintln!("{}: a feed is empty, no snapshot", policy.mode),
        }
    }

    out.flush()?;
    Ok(())
}
