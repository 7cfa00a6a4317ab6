//! Migration Detector
//!
//! One detection cycle: load the cursor, list the candidate window, filter
//! against the processed-signature history, classify in bounded concurrent
//! groups, then persist history and cursor. Cycles are strictly sequential;
//! a listing failure aborts the cycle before any persisted state changes.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::domain::classifier::classify;
use crate::domain::dedup::{CursorData, CursorStore, SignatureHistory, StoreError};
use crate::domain::models::{unix_to_iso, ParsedMigration};
use crate::ports::ledger::{LedgerError, LedgerPort};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

/// Detection parameters, owned by the config layer
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Launchpad program whose transaction stream is scanned
    pub program_address: String,
    /// Lookback window in seconds
    pub window_seconds: u64,
    /// Max signatures per listing page
    pub page_limit: usize,
    /// Concurrent fetch+classify operations per group
    pub concurrency: usize,
    /// Mints excluded from mint extraction
    pub ignored_mints: HashSet<String>,
}

/// Result of one detection cycle
#[derive(Debug)]
pub struct CycleOutcome {
    /// Newly detected migrations, newest first
    pub migrations: Vec<ParsedMigration>,
    /// Cursor state after the cycle
    pub cursor: CursorData,
}

/// Orchestrates the poll-classify-persist loop over a ledger port
pub struct MigrationDetector<L: LedgerPort + 'static> {
    ledger: Arc<L>,
    config: DetectorConfig,
    history: SignatureHistory,
    cursor: CursorStore,
}

impl<L: LedgerPort + 'static> MigrationDetector<L> {
    pub fn new(
        ledger: Arc<L>,
        config: DetectorConfig,
        history: SignatureHistory,
        cursor: CursorStore,
    ) -> Self {
        Self {
            ledger,
            config,
            history,
            cursor,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn cursor_data(&self) -> &CursorData {
        self.cursor.data()
    }

    /// Run one cycle against the current wall clock
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, DetectorError> {
        self.run_cycle_at(chrono::Utc::now().timestamp()).await
    }

    /// Run one cycle with an explicit "now", windowing back from it
    pub async fn run_cycle_at(&mut self, now: i64) -> Result<CycleOutcome, DetectorError> {
        let window_start = now - self.config.window_seconds as i64;
        let until = self.cursor.data().newest_signature.clone();

        let candidates = self
            .ledger
            .list_signatures_in_window(
                &self.config.program_address,
                window_start,
                until.as_deref(),
                self.config.page_limit,
            )
            .await?;

        let unprocessed: Vec<_> = candidates
            .into_iter()
            .filter(|info| !self.history.contains(&info.signature))
            .collect();

        tracing::info!(
            "Cycle window [{} ..]: {} unprocessed candidate(s)",
            window_start,
            unprocessed.len()
        );

        let mut migrations: Vec<ParsedMigration> = Vec::new();
        let mut processed: Vec<String> = Vec::new();
        let mut had_failures = false;

        let group_size = self.config.concurrency.max(1);
        for group in unprocessed.chunks(group_size) {
            // Bounded group: everything in the group runs concurrently, the
            // next group starts only after the whole group settles.
            let mut join_set = JoinSet::new();
            for (index, info) in group.iter().enumerate() {
                let ledger = Arc::clone(&self.ledger);
                let signature = info.signature.clone();
                let ignored = self.config.ignored_mints.clone();
                join_set.spawn(async move {
                    let outcome = ledger
                        .fetch_transaction(&signature)
                        .await
                        .map(|maybe_tx| maybe_tx.and_then(|tx| classify(&tx, &ignored)));
                    (index, signature, outcome)
                });
            }

            let mut settled = Vec::with_capacity(group.len());
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(item) => settled.push(item),
                    Err(e) => {
                        had_failures = true;
                        tracing::warn!("Classification task failed to complete: {}", e);
                    }
                }
            }
            // Restore fetch order inside the group
            settled.sort_by_key(|(index, _, _)| *index);

            for (_, signature, outcome) in settled {
                match outcome {
                    Ok(Some(migration)) => {
                        tracing::info!(
                            "Migration detected: mint {} in {}",
                            migration.mint,
                            signature
                        );
                        migrations.push(migration);
                        processed.push(signature);
                    }
                    // Not a migration, or the transaction no longer exists;
                    // either way the signature is settled for good.
                    Ok(None) => processed.push(signature),
                    Err(e) => {
                        had_failures = true;
                        tracing::warn!(
                            "Skipping {} this cycle ({}); it stays unprocessed and will be retried",
                            signature,
                            e
                        );
                    }
                }
            }
        }

        self.history.insert_many(processed);

        let run_at = unix_to_iso(now);
        match unprocessed.first() {
            // Advancing the cursor past a failed item would put it beyond the
            // `until` bound forever, so the bound only moves on clean cycles.
            Some(newest) if !had_failures => {
                self.cursor
                    .advance(newest.signature.clone(), newest.block_time, run_at);
            }
            _ => self.cursor.touch(run_at),
        }

        self.history.save()?;
        self.cursor.save()?;

        Ok(CycleOutcome {
            migrations,
            cursor: self.cursor.data().clone(),
        })
    }
}
