//! Solana RPC adapter

pub mod rpc;

pub use rpc::RpcLedgerClient;
