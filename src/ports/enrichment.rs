//! Enrichment Ports
//!
//! Trait seams for the two off-chain enrichment providers: token metadata and
//! price/market-cap. Absence of data is modeled in the return types, not as
//! errors; the error variants cover transport failures only.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{PriceData, TokenMetadata};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Price API returned status {0}")]
    Status(u16),
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Resolves human-readable metadata for a token mint. Unknown tokens resolve
/// to all-None metadata, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataPort: Send + Sync {
    async fn resolve(&self, mint: &str) -> Result<TokenMetadata, MetadataError>;
}

/// Resolves USD price and market cap for a token mint. A token the API does
/// not know yields empty `PriceData`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricePort: Send + Sync {
    async fn fetch_price(&self, mint: &str) -> Result<PriceData, PriceError>;
}
