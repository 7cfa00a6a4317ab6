//! Enrichment Driver
//!
//! Turns classified migrations into publishable results: metadata, USD price,
//! market cap (direct or derived from on-chain supply), then the market-cap
//! floor and the final descending sort. Enrichment runs strictly sequentially
//! since the price API's rate limit dominates its runtime, and every lookup
//! failure degrades to "unknown" rather than dropping the cycle.

use std::sync::Arc;

use crate::domain::models::{unix_to_iso, MigrationResult, ParsedMigration, TokenMetadata};
use crate::ports::enrichment::{MetadataPort, PricePort};
use crate::ports::ledger::LedgerPort;

pub struct Enricher<L: LedgerPort> {
    ledger: Arc<L>,
    metadata: Arc<dyn MetadataPort>,
    prices: Arc<dyn PricePort>,
    /// Results with a market cap below this are dropped from the report
    market_cap_floor_usd: f64,
}

impl<L: LedgerPort> Enricher<L> {
    pub fn new(
        ledger: Arc<L>,
        metadata: Arc<dyn MetadataPort>,
        prices: Arc<dyn PricePort>,
        market_cap_floor_usd: f64,
    ) -> Self {
        Self {
            ledger,
            metadata,
            prices,
            market_cap_floor_usd,
        }
    }

    /// Enrich, filter by the market-cap floor, and sort descending by market
    /// cap (unknown caps sort as zero).
    pub async fn enrich(&self, migrations: &[ParsedMigration]) -> Vec<MigrationResult> {
        let mut results = Vec::with_capacity(migrations.len());

        for migration in migrations {
            let result = self.enrich_one(migration).await;
            let market_cap = result.market_cap_usd.unwrap_or(0.0);
            if market_cap < self.market_cap_floor_usd {
                tracing::debug!(
                    "Dropping {} below market-cap floor ({:.2} < {:.2})",
                    migration.mint,
                    market_cap,
                    self.market_cap_floor_usd
                );
                continue;
            }
            results.push(result);
        }

        results.sort_by(|a, b| {
            let a_cap = a.market_cap_usd.unwrap_or(0.0);
            let b_cap = b.market_cap_usd.unwrap_or(0.0);
            b_cap
                .partial_cmp(&a_cap)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results
    }

    async fn enrich_one(&self, migration: &ParsedMigration) -> MigrationResult {
        let metadata = match self.metadata.resolve(&migration.mint).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Metadata resolution failed for {}: {}", migration.mint, e);
                TokenMetadata::default()
            }
        };

        let price = match self.prices.fetch_price(&migration.mint).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Price lookup failed for {}: {}", migration.mint, e);
                Default::default()
            }
        };

        let market_cap_usd = match (price.market_cap_usd, price.price_usd) {
            (Some(cap), _) => Some(cap),
            // No direct figure: derive one from circulating supply
            (None, Some(price_usd)) => self
                .fetch_supply(&migration.mint)
                .await
                .map(|supply| price_usd * supply),
            (None, None) => None,
        };

        MigrationResult {
            time: unix_to_iso(migration.block_time),
            signature: migration.signature.clone(),
            mint: migration.mint.clone(),
            symbol: metadata.symbol,
            name: metadata.name,
            market_cap_usd,
            price_usd: price.price_usd,
            destination: migration.destination,
        }
    }

    async fn fetch_supply(&self, mint: &str) -> Option<f64> {
        match self.ledger.fetch_token_supply(mint).await {
            Ok(supply) => supply,
            Err(e) => {
                tracing::warn!("Supply lookup failed for {}: {}", mint, e);
                None
            }
        }
    }
}
