//! Ledger Port
//!
//! Trait abstraction over the RPC ledger node. The time-windowed page walk is
//! a provided method so the pagination logic is written once against the
//! page-level primitive and exercised the same way in production and tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{SignatureInfo, TransactionView};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// All interaction with the remote ledger node.
///
/// Transient errors surface after the adapter's retries are exhausted;
/// callers treat them as recoverable per item, not batch-fatal.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// One page of signatures for `address`, newest first: newer than
    /// `until`, older than `before`, at most `limit` entries. Entries lacking
    /// a block time are silently dropped by the implementation.
    async fn list_signatures(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;

    /// Fetch a parsed transaction; None when not found or not yet confirmed.
    async fn fetch_transaction(&self, signature: &str)
        -> Result<Option<TransactionView>, LedgerError>;

    /// Total circulating supply in UI units; None when the lookup fails
    /// (logged by the implementation, never fatal).
    async fn fetch_token_supply(&self, mint: &str) -> Result<Option<f64>, LedgerError>;

    /// Walk pages backward from the newest entry, collecting everything with
    /// `block_time >= window_start`, newest first.
    ///
    /// Paging stops at the first entry older than the window, or when a page
    /// comes back short (end of available history). `until` should carry the
    /// cursor's newest processed signature so the walk never re-fetches
    /// cursor-known ground. Results are NOT deduplicated against persistent
    /// history; that is the dedup store's job.
    async fn list_signatures_in_window(
        &self,
        address: &str,
        window_start: i64,
        until: Option<&str>,
        page_limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let mut collected: Vec<SignatureInfo> = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let page = self
                .list_signatures(address, before.as_deref(), until, page_limit)
                .await?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let mut window_exhausted = false;
            for entry in &page {
                if entry.block_time < window_start {
                    window_exhausted = true;
                    break;
                }
                collected.push(entry.clone());
            }

            if window_exhausted || page_len < page_limit {
                break;
            }
            before = page.last().map(|e| e.signature.clone());
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::ScriptedLedger;

    fn sigs(range: std::ops::Range<u32>, newest_time: i64) -> Vec<SignatureInfo> {
        // Descending block times, newest first, one second apart
        range
            .clone()
            .map(|i| SignatureInfo {
                signature: format!("sig-{}", i),
                slot: 1000 + i as u64,
                block_time: newest_time - (i - range.start) as i64,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_short_page_issues_one_request() {
        // Window covers one page's worth minus one entry; the page is short,
        // so no second request happens.
        let ledger = ScriptedLedger::new().with_signature_pages(vec![sigs(0..9, 1_000_000)]);

        let got = ledger
            .list_signatures_in_window("Addr", 999_000, None, 10)
            .await
            .unwrap();

        assert_eq!(got.len(), 9);
        assert_eq!(ledger.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_three_full_pages_issue_three_requests() {
        // Two full in-window pages, then a full page whose second entry falls
        // outside the window: exactly three requests, newest-to-oldest.
        let page1 = sigs(0..10, 1_000_000);
        let page2 = sigs(10..20, 999_990);
        let mut page3 = sigs(20..30, 999_980);
        for entry in page3.iter_mut().skip(1) {
            entry.block_time = 900_000; // outside the window
        }

        let ledger =
            ScriptedLedger::new().with_signature_pages(vec![page1, page2, page3]);

        let got = ledger
            .list_signatures_in_window("Addr", 999_900, None, 10)
            .await
            .unwrap();

        // 10 + 10 + 1 entries survive the window cut
        assert_eq!(got.len(), 21);
        assert_eq!(got.first().unwrap().signature, "sig-0");
        assert_eq!(got.last().unwrap().signature, "sig-20");

        let calls = ledger.list_calls();
        assert_eq!(calls.len(), 3);
        // Backward pagination: `before` advances to each page's oldest entry
        assert_eq!(calls[0].before, None);
        assert_eq!(calls[1].before.as_deref(), Some("sig-9"));
        assert_eq!(calls[2].before.as_deref(), Some("sig-19"));
    }

    #[tokio::test]
    async fn test_until_bound_is_forwarded() {
        let ledger = ScriptedLedger::new().with_signature_pages(vec![sigs(0..3, 1_000_000)]);

        ledger
            .list_signatures_in_window("Addr", 0, Some("sig-known"), 10)
            .await
            .unwrap();

        let calls = ledger.list_calls();
        assert_eq!(calls[0].until.as_deref(), Some("sig-known"));
    }

    #[tokio::test]
    async fn test_empty_history_returns_empty() {
        let ledger = ScriptedLedger::new();
        let got = ledger
            .list_signatures_in_window("Addr", 0, None, 10)
            .await
            .unwrap();
        assert!(got.is_empty());
        assert_eq!(ledger.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_window_cut_mid_page_stops_pagination() {
        let mut page = sigs(0..10, 1_000_000);
        for entry in page.iter_mut().skip(4) {
            entry.block_time = 100; // well outside
        }
        let ledger = ScriptedLedger::new()
            .with_signature_pages(vec![page, sigs(10..20, 999_000)]);

        let got = ledger
            .list_signatures_in_window("Addr", 999_900, None, 10)
            .await
            .unwrap();

        assert_eq!(got.len(), 4);
        assert_eq!(ledger.list_calls().len(), 1);
    }
}
