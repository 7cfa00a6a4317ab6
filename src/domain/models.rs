//! Core Data Model
//!
//! Plain records flowing through the detection pipeline: ledger signature
//! listings, the flattened transaction view the classifier operates on, and
//! the enriched results published to the report layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One entry from a signatures-for-address listing.
///
/// Entries without a block time are dropped at the adapter boundary, so
/// `block_time` is always present here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Base58 transaction signature
    pub signature: String,
    /// Slot the transaction landed in
    pub slot: u64,
    /// Unix seconds
    pub block_time: i64,
}

/// Token balance snapshot entry (pre or post execution)
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalance {
    /// Index into the transaction's account keys
    pub account_index: u8,
    /// Token mint address
    pub mint: String,
    /// UI-denominated amount; None for zero-amount edge encodings
    pub ui_amount: Option<f64>,
}

/// Flattened view of a fetched transaction.
///
/// The classifier operates on this alone; every field is extracted from the
/// RPC payload with explicit absent-field handling, never accessed raw.
#[derive(Debug, Clone, Default)]
pub struct TransactionView {
    pub signature: String,
    pub block_time: Option<i64>,
    /// Debug rendering of the on-chain error, if the transaction failed
    pub err: Option<String>,
    pub log_messages: Vec<String>,
    /// Static account keys plus any address-table-loaded keys
    pub account_keys: Vec<String>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
}

/// Destination venue the liquidity migrated to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "pumpswap")]
    PumpSwap,
    #[serde(rename = "raydium-amm")]
    RaydiumAmm,
    #[serde(rename = "raydium-clmm")]
    RaydiumClmm,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::PumpSwap => "pumpswap",
            Destination::RaydiumAmm => "raydium-amm",
            Destination::RaydiumClmm => "raydium-clmm",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified migration, before enrichment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMigration {
    pub signature: String,
    /// Unix seconds
    pub block_time: i64,
    /// Mint of the token that graduated
    pub mint: String,
    /// None when no known venue program appears in the account keys
    pub destination: Option<Destination>,
}

/// Resolved token metadata. All-None is a valid outcome for tokens that never
/// minted metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
}

impl TokenMetadata {
    /// True when neither a name nor a symbol was resolved
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none()
    }
}

/// Price lookup result. Absence of data is not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceData {
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
}

/// Fully enriched migration, as published
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// ISO-8601 time derived from the block time
    pub time: String,
    pub signature: String,
    pub mint: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub market_cap_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub destination: Option<Destination>,
}

/// The published result set, sorted descending by market cap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// ISO-8601 timestamp of the run
    pub run_at: String,
    pub window_seconds: u64,
    pub migrations: Vec<MigrationResult>,
}

impl MigrationReport {
    /// Write the report as pretty-printed JSON (wholesale replace)
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

/// Render a unix timestamp as ISO-8601 (UTC). Degenerate times render as the
/// epoch rather than failing the record.
pub fn unix_to_iso(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"))
        .to_rfc3339()
}
