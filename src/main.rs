//! station-board: live arrivals board daemon.
//!
//! Single-binary Tokio application that:
//! 1. Seeds the master schedule and builds the current-day snapshot
//! 2. Refreshes upcoming arrivals every 5 minutes via the lookup provider
//! 3. Serves read projections (arrivals board, stats, weather)
//! 4. Rolls the snapshot over at the day boundary

mod config;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info, warn};

use board::{QueryFacade, RefreshScheduler, SnapshotManager, WeatherCache};
use realtime_client::{ScriptLookupProvider, ScriptWeatherProvider};
use store::{MemoryMasterStore, MemorySnapshotStore};

/// Station arrivals board daemon.
#[derive(Parser)]
#[command(name = "station-board", about = "Live station arrivals board")]
struct Cli {
    /// Print the current arrivals board and exit.
    #[arg(long)]
    board: bool,

    /// Run one bulk refresh over the whole table, print the report, exit.
    #[arg(long)]
    bulk_refresh: bool,

    /// Run one catch-up refresh (rows already due), print the report, exit.
    #[arg(long)]
    catch_up: bool,

    /// Fetch (or serve cached) weather and exit.
    #[arg(long)]
    weather: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "station_board=info,board=info,store=info,realtime_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("🚉 Station board starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Station: {}", cfg.station_name);
    info!(
        "Timing: refresh={}s, lookahead={}min, batch={}, lookup_timeout={}s, weather_ttl={}s",
        cfg.timing.refresh_interval_secs,
        cfg.timing.lookahead_mins,
        cfg.timing.bulk_batch_size,
        cfg.timing.lookup_timeout_secs,
        cfg.timing.weather_ttl_secs,
    );

    // Seed the master schedule.
    let master = match MemoryMasterStore::load(&cfg.schedule_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to load schedule from {}: {}", cfg.schedule_path, e);
            std::process::exit(1);
        }
    };

    // ── Shared state ─────────────────────────────────────────────────
    let manager = Arc::new(SnapshotManager::new(
        master,
        Arc::new(MemorySnapshotStore::new()),
    ));
    let lookup_timeout = Duration::from_secs(cfg.timing.lookup_timeout_secs);
    let scheduler = Arc::new(RefreshScheduler::new(
        manager.clone(),
        Arc::new(ScriptLookupProvider::new(
            cfg.scripts.python_bin.clone(),
            cfg.scripts.realtime_script.clone(),
            lookup_timeout,
        )),
        lookup_timeout,
        cfg.timing.lookahead_mins,
        cfg.timing.bulk_batch_size,
    ));
    let weather = Arc::new(WeatherCache::new(
        Arc::new(ScriptWeatherProvider::new(
            cfg.scripts.python_bin.clone(),
            cfg.scripts.weather_script.clone(),
            lookup_timeout,
        )),
        Duration::from_secs(cfg.timing.weather_ttl_secs),
    ));
    let queries = QueryFacade::new(manager.clone());

    // Build the initial day snapshot.
    let rollover = manager.ensure_fresh().await;
    match (&rollover.day, &rollover.warning) {
        (Some(day), None) => info!("Snapshot ready for {}", day),
        (_, Some(w)) => warn!("Starting without a fresh snapshot: {}", w),
        _ => {}
    }

    // ── One-shot modes ───────────────────────────────────────────────
    if cli.board {
        match queries.arrivals_board().await {
            Ok(view) => {
                info!("Arrivals at {} ({} trains):", view.current_time, view.total);
                for row in &view.rows {
                    info!(
                        "  {:<6} {:<28} sched={} est={} platform={:<3} {}",
                        row.id, row.name, row.scheduled, row.estimated, row.platform, row.status
                    );
                }
            }
            Err(e) => {
                error!("Board read failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.bulk_refresh || cli.catch_up {
        let result = if cli.bulk_refresh {
            scheduler.refresh_all().await
        } else {
            scheduler.refresh_catch_up().await
        };
        match result {
            Ok(report) => info!(
                "Refresh done: selected={} updated={} errors={}",
                report.total_selected, report.updated, report.errors
            ),
            Err(e) => {
                error!("Refresh failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.weather {
        match weather.get().await {
            Ok(report) => {
                if let Some(w) = &report.warning {
                    warn!("{}", w);
                }
                info!(
                    "Weather: {:.1}°C, {:.0}% humidity, {:.1}mm precipitation (cached={})",
                    report.sample.temperature,
                    report.sample.humidity,
                    report.sample.precipitation,
                    report.cached
                );
            }
            Err(e) => {
                error!("Weather fetch failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // ── Spawn tasks ──────────────────────────────────────────────────
    info!("Spawning tasks...");

    // Task 1: Windowed refresh timer. A failed tick logs and the loop
    // continues; one bad cycle must never suppress the next.
    let refresh_scheduler = scheduler.clone();
    let refresh_interval = Duration::from_secs(cfg.timing.refresh_interval_secs);
    let refresh_handle = tokio::spawn(async move {
        loop {
            match refresh_scheduler.refresh_upcoming().await {
                Ok(report) if report.total_selected > 0 => info!(
                    "Upcoming refresh: selected={} updated={} errors={}",
                    report.total_selected, report.updated, report.errors
                ),
                Ok(_) => info!("Upcoming refresh: no arrivals in window"),
                Err(e) => warn!("Upcoming refresh failed: {}", e),
            }
            sleep(refresh_interval).await;
        }
    });

    // Task 2: Heartbeat.
    let hb_manager = manager.clone();
    let hb_interval = Duration::from_secs(cfg.timing.heartbeat_secs);
    let heartbeat_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(hb_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match hb_manager.rows().await {
                Ok(rows) => {
                    let enriched = rows.iter().filter(|r| r.is_enriched()).count();
                    info!(
                        "HEARTBEAT: day={} rows={} enriched={}",
                        hb_manager.current_day_tag(),
                        rows.len(),
                        enriched
                    );
                }
                Err(e) => warn!("HEARTBEAT: snapshot unreadable: {}", e),
            }
        }
    });

    // ── Wait for shutdown ────────────────────────────────────────────
    info!("🚆 Station board is running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        r = refresh_handle => {
            error!("Refresh task exited: {:?}", r);
        }
        r = heartbeat_handle => {
            error!("Heartbeat task exited: {:?}", r);
        }
    }

    info!("Station board shut down.");
}
