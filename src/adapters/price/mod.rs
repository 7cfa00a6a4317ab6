//! Market price adapter

pub mod gecko;

pub use gecko::GeckoTerminalClient;
