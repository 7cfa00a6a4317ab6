//! Token metadata adapter

pub mod resolver;
pub mod types;

pub use resolver::OnChainMetadataResolver;
