//! Configuration Layer

pub mod loader;

pub use loader::{load_config, parse_window_preset, Config, ConfigError};
