//! Adapters Layer - concrete implementations of the ports
//!
//! Each adapter talks to one external system: the Solana RPC node, the
//! on-chain metadata programs, and the GeckoTerminal price API.

pub mod cli;
pub mod metadata;
pub mod price;
pub mod solana;
