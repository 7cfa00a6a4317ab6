//! Ports Layer - trait definitions for external dependencies
//!
//! Interfaces the adapters implement: the ledger node, the metadata resolver,
//! and the price feed. `mocks` holds scripted implementations for tests.

pub mod enrichment;
pub mod ledger;
pub mod mocks;
