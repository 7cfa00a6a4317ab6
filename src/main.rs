//! Migration Radar - bonding-curve liquidity migration detector for Solana

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use migration_radar::adapters::cli::{CliApp, Command, ScanCmd, StatusCmd, WatchCmd};
use migration_radar::adapters::metadata::OnChainMetadataResolver;
use migration_radar::adapters::price::GeckoTerminalClient;
use migration_radar::adapters::solana::RpcLedgerClient;
use migration_radar::application::{Enricher, MigrationDetector};
use migration_radar::config::{load_config, parse_window_preset, Config};
use migration_radar::domain::dedup::{CursorStore, SignatureHistory};
use migration_radar::domain::models::{unix_to_iso, MigrationReport, MigrationResult};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug);

    match app.command {
        Command::Scan(cmd) => scan_command(cmd).await,
        Command::Watch(cmd) => watch_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).init();
}

/// Everything a detection cycle needs, wired from config
struct Pipeline {
    detector: MigrationDetector<RpcLedgerClient>,
    enricher: Enricher<RpcLedgerClient>,
    window_seconds: u64,
    report_path: std::path::PathBuf,
}

fn build_pipeline(
    mut config: Config,
    rpc_override: Option<String>,
    window_override: Option<&str>,
) -> Result<Pipeline> {
    if let Some(url) = rpc_override {
        config.solana.rpc_url = url;
    }

    let mut detector_config = config.detector_config();
    if let Some(window) = window_override {
        detector_config.window_seconds =
            parse_window_preset(window).context("Invalid --window value")?;
    }
    let window_seconds = detector_config.window_seconds;

    let rpc_url = config.solana.get_rpc_url();
    let ledger = Arc::new(RpcLedgerClient::new(rpc_url.clone()));

    let history = SignatureHistory::load(config.storage.history_path());
    let cursor = CursorStore::load(config.storage.cursor_path());
    let detector =
        MigrationDetector::new(Arc::clone(&ledger), detector_config, history, cursor);

    let metadata = Arc::new(OnChainMetadataResolver::new(rpc_url));
    let prices = Arc::new(GeckoTerminalClient::new(config.enrichment.get_api_key()));
    let enricher = Enricher::new(
        ledger,
        metadata,
        prices,
        config.enrichment.market_cap_floor_usd,
    );

    Ok(Pipeline {
        detector,
        enricher,
        window_seconds,
        report_path: config.storage.report_path(),
    })
}

/// One full cycle: detect, enrich, publish
async fn run_cycle(pipeline: &mut Pipeline) -> Result<MigrationReport> {
    let outcome = pipeline.detector.run_cycle().await?;
    tracing::info!("Cycle complete: {} migration(s) detected", outcome.migrations.len());

    let migrations = pipeline.enricher.enrich(&outcome.migrations).await;

    let report = MigrationReport {
        run_at: unix_to_iso(chrono::Utc::now().timestamp()),
        window_seconds: pipeline.window_seconds,
        migrations,
    };
    report
        .save(&pipeline.report_path)
        .with_context(|| format!("Failed to write report to {}", pipeline.report_path.display()))?;

    Ok(report)
}

fn print_report(report: &MigrationReport) {
    println!(
        "{} migration(s) in the last {}s (run at {})",
        report.migrations.len(),
        report.window_seconds,
        report.run_at
    );
    for migration in &report.migrations {
        print_migration(migration);
    }
}

fn print_migration(migration: &MigrationResult) {
    let symbol = migration.symbol.as_deref().unwrap_or("?");
    let market_cap = migration
        .market_cap_usd
        .map(|cap| format!("${:.0}", cap))
        .unwrap_or_else(|| "unknown mcap".to_string());
    let destination = migration
        .destination
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown venue".to_string());
    println!(
        "  {}  {:<10} {:>14}  -> {}  ({})",
        migration.time, symbol, market_cap, destination, migration.mint
    );
}

async fn scan_command(cmd: ScanCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let mut pipeline = build_pipeline(config, cmd.rpc_url, cmd.window.as_deref())?;

    let report = run_cycle(&mut pipeline).await?;
    print_report(&report);
    Ok(())
}

async fn watch_command(cmd: WatchCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let interval = Duration::from_secs(
        cmd.interval.unwrap_or(config.detector.poll_interval_secs),
    );
    let mut pipeline = build_pipeline(config, cmd.rpc_url, cmd.window.as_deref())?;

    tracing::info!("Watching for migrations every {:?}", interval);

    loop {
        // A failed cycle is logged; the next scheduled cycle proceeds
        match run_cycle(&mut pipeline).await {
            Ok(report) => print_report(&report),
            Err(e) => tracing::error!("Detection cycle failed: {:#}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;

    let history = SignatureHistory::load(config.storage.history_path());
    let cursor = CursorStore::load(config.storage.cursor_path());

    println!("Data directory: {}", config.storage.data_dir().display());
    println!("Processed signatures: {}", history.len());
    println!(
        "Cursor: {} (block time {})",
        cursor.data().newest_signature.as_deref().unwrap_or("none"),
        cursor
            .data()
            .newest_block_time
            .map(|t| unix_to_iso(t))
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!(
        "Last run: {}",
        cursor.data().last_run_at.as_deref().unwrap_or("never")
    );

    let report_path = config.storage.report_path();
    if Path::new(&report_path).exists() {
        let content = std::fs::read_to_string(&report_path)
            .with_context(|| format!("Failed to read {}", report_path.display()))?;
        let report: MigrationReport =
            serde_json::from_str(&content).context("Latest report is malformed")?;
        println!();
        print_report(&report);
    } else {
        println!("No report written yet");
    }

    Ok(())
}
