//! Dedup Store
//!
//! Two independently persisted structures that make repeated polling
//! idempotent: a bounded history of processed signatures and a pagination
//! cursor. Both are loaded at startup and rewritten wholesale after each
//! detection cycle. Single process, single writer — this is a hard
//! precondition, not enforced by locking.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cap on the persisted history; oldest entries drop first
pub const MAX_HISTORY_ENTRIES: usize = 10_000;

/// Default file name for the processed-signature history
pub const HISTORY_FILE: &str = "history.json";
/// Default file name for the pagination cursor
pub const CURSOR_FILE: &str = "cursor.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write state file: {0}")]
    Write(String),
    #[error("Failed to serialize state: {0}")]
    Serialize(String),
}

/// On-disk shape of the history file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryData {
    processed_signatures: Vec<String>,
}

/// Bounded, insertion-ordered set of processed transaction signatures.
///
/// The set is authoritative for "already processed"; the cursor alone cannot
/// detect out-of-order or backfilled signatures.
#[derive(Debug)]
pub struct SignatureHistory {
    path: PathBuf,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl SignatureHistory {
    /// Load persisted history. Missing or corrupt state starts empty — a
    /// warning, never a fatal error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HistoryData>(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "History file {} is corrupt ({}), starting with empty history",
                        path.display(),
                        e
                    );
                    HistoryData::default()
                }
            },
            Err(_) => HistoryData::default(),
        };

        let mut history = Self {
            path,
            order: VecDeque::new(),
            seen: HashSet::new(),
        };
        history.insert_many(data.processed_signatures);
        history
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.seen.contains(signature)
    }

    /// Idempotent insert preserving insertion order; truncates to the most
    /// recent `MAX_HISTORY_ENTRIES` by dropping the oldest.
    pub fn insert_many<I, S>(&mut self, signatures: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for signature in signatures {
            let signature = signature.into();
            if self.seen.insert(signature.clone()) {
                self.order.push_back(signature);
            }
        }
        while self.order.len() > MAX_HISTORY_ENTRIES {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rewrite the persisted file wholesale (pretty JSON)
    pub fn save(&self) -> Result<(), StoreError> {
        let data = HistoryData {
            processed_signatures: self.order.iter().cloned().collect(),
        };
        write_json(&self.path, &data)
    }
}

/// Pagination cursor: the newest signature/time seen in the last non-empty
/// batch, used as the `until` bound for the next listing walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorData {
    pub newest_signature: Option<String>,
    pub newest_block_time: Option<i64>,
    /// ISO-8601 timestamp of the last completed cycle
    pub last_run_at: Option<String>,
}

#[derive(Debug)]
pub struct CursorStore {
    path: PathBuf,
    data: CursorData,
}

impl CursorStore {
    /// Load the persisted cursor; missing or corrupt state starts fresh.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CursorData>(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "Cursor file {} is corrupt ({}), starting from scratch",
                        path.display(),
                        e
                    );
                    CursorData::default()
                }
            },
            Err(_) => CursorData::default(),
        };
        Self { path, data }
    }

    pub fn data(&self) -> &CursorData {
        &self.data
    }

    /// Advance to the newest signature of a non-empty batch
    pub fn advance(&mut self, newest_signature: String, newest_block_time: i64, run_at: String) {
        self.data.newest_signature = Some(newest_signature);
        self.data.newest_block_time = Some(newest_block_time);
        self.data.last_run_at = Some(run_at);
    }

    /// Record a completed run without moving the signature bound
    pub fn touch(&mut self, run_at: String) {
        self.data.last_run_at = Some(run_at);
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_json(&self.path, &self.data)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Write(e.to_string()))?;
    }
    let content =
        serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| StoreError::Write(e.to_string()))
}
