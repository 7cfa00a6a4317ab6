//! Known Program Addresses
//!
//! Constants for the pump.fun launchpad, the destination venues migrations
//! land on, and the log markers the classifier keys off.

use std::collections::HashSet;

use super::models::Destination;

/// pump.fun bonding-curve launchpad program
pub const PUMP_FUN_PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// pump.fun migration authority program (moves curve liquidity out)
pub const PUMP_FUN_MIGRATION_PROGRAM: &str = "39azUYFWPz3VHgKCf3VChUwbpURdCHRxjWVowf5jUJjg";

/// PumpSwap AMM
pub const PUMP_SWAP_AMM_PROGRAM: &str = "pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA";

/// Raydium AMM v4
pub const RAYDIUM_AMM_V4_PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

/// Raydium concentrated liquidity
pub const RAYDIUM_CLMM_PROGRAM: &str = "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK";

/// Metaplex token metadata program
pub const TOKEN_METADATA_PROGRAM: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Native SOL mint (wrapped SOL)
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// USDC mint
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Log line emitted by the migrate instruction
pub const MIGRATE_LOG_MARKER: &str = "Program log: Instruction: Migrate";

/// Log fragment emitted for swaps hitting a curve that already graduated.
/// These are repeat attempts, not new migrations.
pub const ALREADY_MIGRATED_LOG_MARKER: &str = "already migrated";

/// Venue programs in detection priority order. PumpSwap's migration and AMM
/// programs are checked before Raydium's, since a PumpSwap migration can also
/// touch Raydium routing accounts on some paths.
pub const DESTINATION_PRIORITY: &[(&str, Destination)] = &[
    (PUMP_FUN_MIGRATION_PROGRAM, Destination::PumpSwap),
    (PUMP_SWAP_AMM_PROGRAM, Destination::PumpSwap),
    (RAYDIUM_AMM_V4_PROGRAM, Destination::RaydiumAmm),
    (RAYDIUM_CLMM_PROGRAM, Destination::RaydiumClmm),
];

/// First venue program found in the account keys wins
pub fn detect_destination(account_keys: &[String]) -> Option<Destination> {
    for (program, destination) in DESTINATION_PRIORITY {
        if account_keys.iter().any(|k| k == program) {
            return Some(*destination);
        }
    }
    None
}

/// Mints excluded from mint extraction by default (quote-side assets)
pub fn default_ignored_mints() -> HashSet<String> {
    [WSOL_MINT, USDC_MINT].iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_priority_order() {
        // A transaction touching both PumpSwap and Raydium resolves to PumpSwap
        let keys = vec![
            RAYDIUM_AMM_V4_PROGRAM.to_string(),
            PUMP_SWAP_AMM_PROGRAM.to_string(),
        ];
        assert_eq!(detect_destination(&keys), Some(Destination::PumpSwap));
    }

    #[test]
    fn test_destination_raydium_variants() {
        let keys = vec![RAYDIUM_CLMM_PROGRAM.to_string()];
        assert_eq!(detect_destination(&keys), Some(Destination::RaydiumClmm));

        let keys = vec![RAYDIUM_AMM_V4_PROGRAM.to_string()];
        assert_eq!(detect_destination(&keys), Some(Destination::RaydiumAmm));
    }

    #[test]
    fn test_destination_unknown_venue() {
        let keys = vec!["SomeRandomProgram1111111111111111111111111".to_string()];
        assert_eq!(detect_destination(&keys), None);
    }

    #[test]
    fn test_default_ignored_mints() {
        let ignored = default_ignored_mints();
        assert!(ignored.contains(WSOL_MINT));
        assert!(ignored.contains(USDC_MINT));
        assert_eq!(ignored.len(), 2);
    }
}
