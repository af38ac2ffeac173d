//! equipment-dash - Heavy-Equipment Telemetry Dashboard
//!
//! Runs the dashboard core headless: three synthetic feeds, the status
//! aggregator and the minute-aligned image-set rotation, logging the status
//! row at a fixed cadence.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults until Ctrl+C
//! cargo run --release
//!
//! # Windowed average, reproducible feeds, JSON status lines for 2 minutes
//! cargo run --release -- --mode avg --seed 7 --json --duration-secs 120
//!
//! # Show the effective configuration
//! cargo run --release -- --config ./dashboard.toml --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `EQUIP_DASH_CONFIG`: Path to the TOML config (default: ./dashboard.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use equipment_dash::clock::{local_hms, SharedClock, SystemClock};
use equipment_dash::config::{defaults, DashboardConfig};
use equipment_dash::feeds::FeedSet;
use equipment_dash::rotation::{ActiveSet, SetRotation};
use equipment_dash::status::{StatusAggregator, StatusLevel, StatusRow, StatusView};
use equipment_dash::types::{AggregationMode, StatusSnapshot};
use equipment_dash::vehicles::{SearchHit, VehicleIndex};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "equipment-dash")]
#[command(about = "Heavy-equipment telemetry dashboard core")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML config (overrides EQUIP_DASH_CONFIG and ./dashboard.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Aggregation mode: latest or avg (overrides [status].mode)
    #[arg(short, long)]
    mode: Option<AggregationMode>,

    /// Random seed for reproducible feeds
    #[arg(long)]
    seed: Option<u64>,

    /// Vehicle to monitor (exact VIN or a case-insensitive fragment)
    #[arg(long, value_name = "QUERY")]
    vin: Option<String>,

    /// Seconds between status reports
    #[arg(long, default_value_t = defaults::REPORT_INTERVAL_SECS)]
    report_secs: u64,

    /// Stop after this many seconds (default: run until Ctrl+C)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Print status reports as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

// ============================================================================
// Status Report
// ============================================================================

/// One status report line.
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    ts: i64,
    t: String,
    vin: &'a str,
    set_index: usize,
    engine_img: &'a str,
    hydraulic_img: &'a str,
    overall: StatusLevel,
    snapshot: StatusSnapshot,
    row: StatusRow,
}

fn report(
    clock: &SharedClock,
    view: &StatusView,
    active: &ActiveSet,
    config: &DashboardConfig,
    vin: &str,
    json: bool,
) -> Result<()> {
    let snapshot = view.current();
    let row = StatusRow::build(&snapshot, Some(&active.set.limits()), &config.levels);
    let overall = row.overall();

    if json {
        let ts = clock.now_ms();
        let line = StatusReport {
            ts,
            t: local_hms(ts),
            vin,
            set_index: active.index,
            engine_img: &active.set.engine_img,
            hydraulic_img: &active.set.hydraulic_img,
            overall,
            snapshot,
            row,
        };
        println!("{}", serde_json::to_string(&line).context("Failed to encode status report")?);
    } else if overall == StatusLevel::Success {
        info!(vin, set = active.index, "{}", row);
    } else {
        warn!(vin, set = active.index, overall = %overall, "{}", row);
    }
    Ok(())
}

// ============================================================================
// Dashboard Runner
// ============================================================================

/// Start every component, report until cancelled, then stop them in order.
async fn run_dashboard(
    config: DashboardConfig,
    args: &CliArgs,
    vin: String,
    cancel_token: CancellationToken,
) -> Result<()> {
    let clock: SharedClock = Arc::new(SystemClock);

    let feeds = FeedSet::from_config(&config.feeds, clock.clone(), args.seed);
    let aggregator = StatusAggregator::new(
        config.status.to_status_config(),
        feeds.readers(),
        clock.clone(),
    );
    let mut rotation = SetRotation::new(
        config.rotation.sets.clone(),
        config.rotation.interval_ms,
        clock.clone(),
    )
    .context("Invalid rotation configuration")?
    .with_parent(&cancel_token);
    rotation.attach_hot_seed(aggregator.hot_seed());

    let feeds = feeds.start(&cancel_token);
    let aggregator = aggregator.start(cancel_token.child_token());
    rotation.resume();
    let view = aggregator.view();

    info!(
        vin = %vin,
        sets = rotation.len(),
        report_secs = args.report_secs,
        "Dashboard running"
    );

    let period = Duration::from_secs(args.report_secs.max(1));
    let mut reports = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    reports.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = args.duration_secs.map(Duration::from_secs);
    let run_for = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(run_for);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Shutdown signal received");
                break;
            }
            _ = &mut run_for => {
                info!(duration_secs = ?args.duration_secs, "Run duration elapsed");
                break;
            }
            _ = reports.tick() => {
                report(&clock, &view, &rotation.current(), &config, &vin, args.json)?;
            }
        }
    }

    // Ordered shutdown: rotation, aggregator, then the feeds it reads.
    rotation.shutdown().await.context("Rotation task failed")?;
    let aggregator = aggregator.stop().await.context("Status aggregator task failed")?;
    let feeds = feeds.stop().await.context("Feed task failed")?;

    let (published, skipped) = aggregator.counters();
    info!(
        published,
        skipped,
        vibration = feeds.vibration.reader().len().await,
        noise = feeds.noise.reader().len().await,
        rpm_pm = feeds.rpm_pm.reader().len().await,
        "Dashboard stopped"
    );
    Ok(())
}

/// Pick the monitored vehicle: `--vin` if given, else the first known one.
fn select_vehicle(index: &VehicleIndex, query: Option<&str>) -> String {
    match query.and_then(|q| index.resolve(q)) {
        Some(SearchHit::Exact(vin)) => vin,
        Some(SearchHit::Partial(vin)) => {
            info!(query = ?query, vin = %vin, "Resolved partial VIN");
            vin
        }
        Some(SearchHit::Unmatched(raw)) => {
            let suggestions = index.suggestions(&raw);
            warn!(query = %raw, ?suggestions, "Unknown VIN, monitoring as entered");
            raw
        }
        None => index.first().unwrap_or_default().to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load dashboard configuration
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DashboardConfig::load(),
    };
    if let Some(mode) = args.mode {
        config.status.mode = mode;
    }

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!(
        mode = %config.status.mode,
        window_ms = config.status.window_ms,
        tick_ms = config.status.tick_ms,
        seed = ?args.seed,
        "equipment-dash starting"
    );

    let vehicles = VehicleIndex::new(config.vehicles.iter().cloned());
    let vin = select_vehicle(&vehicles, args.vin.as_deref());

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    run_dashboard(config, &args, vin, cancel_token).await?;

    info!("equipment-dash shutdown complete");
    Ok(())
}
