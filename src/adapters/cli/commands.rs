//! CLI Command Definitions
//!
//! Argument parsing for the migration-radar binary, using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Migration Radar - bonding-curve liquidity migration detector for Solana
#[derive(Parser, Debug)]
#[command(
    name = "migration-radar",
    version = env!("CARGO_PKG_VERSION"),
    about = "Detects bonding-curve liquidity migrations on Solana launchpads",
    long_about = "Migration Radar scans a launchpad program's transaction stream for \
                  liquidity migrations (token graduations), enriches them with on-chain \
                  metadata and market data, and publishes a ranked report."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single detection cycle and write the report
    Scan(ScanCmd),

    /// Poll continuously at the configured interval
    Watch(WatchCmd),

    /// Show persisted cursor, history, and latest report summary
    Status(StatusCmd),
}

/// Run one detection cycle
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Lookback window: 1h, 6h, 24h, 7d, or seconds
    #[arg(short, long, value_name = "WINDOW")]
    pub window: Option<String>,

    /// Override RPC URL
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,
}

/// Poll continuously
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Lookback window: 1h, 6h, 24h, 7d, or seconds
    #[arg(short, long, value_name = "WINDOW")]
    pub window: Option<String>,

    /// Seconds between cycles (overrides config)
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Override RPC URL
    #[arg(long, value_name = "URL")]
    pub rpc_url: Option<String>,
}

/// Show persisted state
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,
}
