//! Migration Radar - bonding-curve liquidity migration detector for Solana
//!
//! Scans a launchpad program's transaction stream for liquidity migrations
//! (token graduations), enriches each hit with on-chain metadata and market
//! data, and publishes a market-cap-ranked report.
//!
//! # Modules
//!
//! - `domain`: Core logic (classifier, dedup store, known programs, models)
//! - `ports`: Trait abstractions (LedgerPort, MetadataPort, PricePort)
//! - `adapters`: External implementations (Solana RPC, Metaplex/Token-2022
//!   metadata, GeckoTerminal, CLI)
//! - `application`: Detection cycle orchestration and enrichment
//! - `config`: Configuration loading and validation
//! - `retry`: Bounded exponential backoff for remote calls

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod retry;
