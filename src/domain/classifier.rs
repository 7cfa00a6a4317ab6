//! Migration Classifier
//!
//! Pure decision logic over one fetched transaction: is this a genuine
//! bonding-curve migration, and if so, which token and which venue. Operates
//! solely on the transaction payload; no I/O, no clock, deterministic.

use std::collections::{HashMap, HashSet};

use super::known_programs::{
    detect_destination, ALREADY_MIGRATED_LOG_MARKER, MIGRATE_LOG_MARKER, PUMP_FUN_PROGRAM,
};
use super::models::{ParsedMigration, TokenBalance, TransactionView};

/// Classify one transaction. Returns None when it is not a new migration.
///
/// Acceptance requires, in order: a successful transaction, the migrate
/// instruction marker in the logs, the absence of the already-migrated
/// marker, the launchpad program among the account keys, and an extractable
/// subject mint.
pub fn classify(tx: &TransactionView, ignored_mints: &HashSet<String>) -> Option<ParsedMigration> {
    if tx.err.is_some() {
        return None;
    }

    let has_migrate = tx.log_messages.iter().any(|l| l.contains(MIGRATE_LOG_MARKER));
    if !has_migrate {
        return None;
    }

    // Repeat swap attempts against a graduated curve log the migrate
    // instruction too; the duplicate marker disqualifies them.
    let already_migrated = tx
        .log_messages
        .iter()
        .any(|l| l.contains(ALREADY_MIGRATED_LOG_MARKER));
    if already_migrated {
        tracing::debug!("{}: curve already migrated, skipping", tx.signature);
        return None;
    }

    if !tx.account_keys.iter().any(|k| k == PUMP_FUN_PROGRAM) {
        return None;
    }

    let mint = extract_mint(tx, ignored_mints)?;
    let destination = detect_destination(&tx.account_keys);

    Some(ParsedMigration {
        signature: tx.signature.clone(),
        block_time: tx.block_time.unwrap_or(0),
        mint,
        destination,
    })
}

/// Pick the subject token mint from the balance snapshots.
///
/// Candidates are the distinct non-ignored mints across pre and post
/// balances, in first-appearance order. A single candidate wins outright;
/// among several, the one with the largest absolute change in total UI
/// balance wins, and only a strictly greater change displaces the incumbent
/// (equal changes keep the first-encountered candidate).
fn extract_mint(tx: &TransactionView, ignored_mints: &HashSet<String>) -> Option<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for balance in tx.pre_token_balances.iter().chain(&tx.post_token_balances) {
        if ignored_mints.contains(&balance.mint) {
            continue;
        }
        if seen.insert(balance.mint.as_str()) {
            candidates.push(balance.mint.clone());
        }
    }

    match candidates.len() {
        0 => {
            tracing::debug!("{}: no candidate mint in balance snapshots", tx.signature);
            None
        }
        1 => Some(candidates.remove(0)),
        _ => {
            let pre = total_by_mint(&tx.pre_token_balances);
            let post = total_by_mint(&tx.post_token_balances);

            let mut selected: Option<String> = None;
            let mut best_change = f64::NEG_INFINITY;
            for mint in candidates {
                let change = (post.get(&mint).copied().unwrap_or(0.0)
                    - pre.get(&mint).copied().unwrap_or(0.0))
                .abs();
                if change > best_change {
                    best_change = change;
                    selected = Some(mint);
                }
            }
            selected
        }
    }
}

/// Sum UI amounts per mint across all balance entries
fn total_by_mint(balances: &[TokenBalance]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for balance in balances {
        *totals.entry(balance.mint.clone()).or_insert(0.0) += balance.ui_amount.unwrap_or(0.0);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::known_programs::{
        default_ignored_mints, PUMP_SWAP_AMM_PROGRAM, RAYDIUM_AMM_V4_PROGRAM, WSOL_MINT,
    };
    use crate::domain::models::Destination;

    fn balance(mint: &str, amount: f64) -> TokenBalance {
        TokenBalance {
            account_index: 0,
            mint: mint.to_string(),
            ui_amount: Some(amount),
        }
    }

    fn migration_tx(mint: &str) -> TransactionView {
        TransactionView {
            signature: "sig-migrate".into(),
            block_time: Some(1_700_000_100),
            err: None,
            log_messages: vec![
                "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P invoke [1]".into(),
                MIGRATE_LOG_MARKER.to_string(),
                "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P success".into(),
            ],
            account_keys: vec![
                PUMP_FUN_PROGRAM.to_string(),
                PUMP_SWAP_AMM_PROGRAM.to_string(),
            ],
            pre_token_balances: vec![balance(mint, 1000.0), balance(WSOL_MINT, 85.0)],
            post_token_balances: vec![balance(mint, 700.0), balance(WSOL_MINT, 0.0)],
        }
    }

    #[test]
    fn test_accepts_genuine_migration() {
        let tx = migration_tx("MintM1");
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.mint, "MintM1");
        assert_eq!(parsed.signature, "sig-migrate");
        assert_eq!(parsed.block_time, 1_700_000_100);
        assert_eq!(parsed.destination, Some(Destination::PumpSwap));
    }

    #[test]
    fn test_rejects_failed_transaction_regardless_of_logs() {
        let mut tx = migration_tx("MintM1");
        tx.err = Some("InstructionError(2, Custom(6002))".into());
        assert!(classify(&tx, &default_ignored_mints()).is_none());
    }

    #[test]
    fn test_rejects_without_migrate_marker() {
        let mut tx = migration_tx("MintM1");
        tx.log_messages = vec!["Program log: Instruction: Buy".into()];
        assert!(classify(&tx, &default_ignored_mints()).is_none());
    }

    #[test]
    fn test_rejects_already_migrated_even_with_migrate_marker() {
        let mut tx = migration_tx("MintM1");
        tx.log_messages
            .push("Program log: Bonding curve already migrated".into());
        assert!(classify(&tx, &default_ignored_mints()).is_none());
    }

    #[test]
    fn test_rejects_without_launchpad_program_key() {
        let mut tx = migration_tx("MintM1");
        tx.account_keys = vec![PUMP_SWAP_AMM_PROGRAM.to_string()];
        assert!(classify(&tx, &default_ignored_mints()).is_none());
    }

    #[test]
    fn test_rejects_when_no_candidate_mint() {
        let mut tx = migration_tx("MintM1");
        // Only ignored mints in the snapshots
        tx.pre_token_balances = vec![balance(WSOL_MINT, 85.0)];
        tx.post_token_balances = vec![balance(WSOL_MINT, 0.0)];
        assert!(classify(&tx, &default_ignored_mints()).is_none());
    }

    #[test]
    fn test_multi_candidate_largest_change_wins() {
        let mut tx = migration_tx("MintA");
        tx.pre_token_balances = vec![balance("MintA", 500.0), balance("MintB", 1000.0)];
        tx.post_token_balances = vec![balance("MintA", 400.0), balance("MintB", 750.0)];
        // MintA changed by 100, MintB by 250
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.mint, "MintB");
    }

    #[test]
    fn test_equal_change_keeps_first_encountered() {
        let mut tx = migration_tx("MintA");
        tx.pre_token_balances = vec![balance("MintA", 500.0), balance("MintB", 500.0)];
        tx.post_token_balances = vec![balance("MintA", 400.0), balance("MintB", 400.0)];
        // Both changed by 100; MintA appeared first
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.mint, "MintA");
    }

    #[test]
    fn test_change_summed_across_balance_entries() {
        let mut tx = migration_tx("MintA");
        // MintB's change is split over two token accounts: 150 + 150 > MintA's 200
        tx.pre_token_balances = vec![
            balance("MintA", 1000.0),
            balance("MintB", 300.0),
            balance("MintB", 300.0),
        ];
        tx.post_token_balances = vec![
            balance("MintA", 800.0),
            balance("MintB", 150.0),
            balance("MintB", 150.0),
        ];
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.mint, "MintB");
    }

    #[test]
    fn test_destination_none_is_still_a_migration() {
        let mut tx = migration_tx("MintM1");
        tx.account_keys = vec![PUMP_FUN_PROGRAM.to_string()];
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.destination, None);
    }

    #[test]
    fn test_destination_raydium() {
        let mut tx = migration_tx("MintM1");
        tx.account_keys = vec![
            PUMP_FUN_PROGRAM.to_string(),
            RAYDIUM_AMM_V4_PROGRAM.to_string(),
        ];
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.destination, Some(Destination::RaydiumAmm));
    }

    #[test]
    fn test_missing_block_time_defaults_to_zero() {
        let mut tx = migration_tx("MintM1");
        tx.block_time = None;
        let parsed = classify(&tx, &default_ignored_mints()).unwrap();
        assert_eq!(parsed.block_time, 0);
    }

    #[test]
    fn test_end_to_end_duplicate_scenario() {
        // One genuine migration and one already-migrated duplicate for the
        // same mint yield exactly one accepted migration.
        let genuine = {
            let mut tx = migration_tx("M1");
            tx.pre_token_balances = vec![balance("M1", 1000.0)];
            tx.post_token_balances = vec![balance("M1", 700.0)];
            tx
        };
        let duplicate = {
            let mut tx = genuine.clone();
            tx.signature = "sig-duplicate".into();
            tx.log_messages
                .push("Program log: Bonding curve already migrated".into());
            tx
        };

        let ignored = default_ignored_mints();
        let accepted: Vec<_> = [genuine, duplicate]
            .iter()
            .filter_map(|tx| classify(tx, &ignored))
            .collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].mint, "M1");
        assert_eq!(accepted[0].signature, "sig-migrate");
    }
}
