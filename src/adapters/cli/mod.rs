//! CLI Adapter
//!
//! Command-line interface for the migration-radar binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, ScanCmd, StatusCmd, WatchCmd};
