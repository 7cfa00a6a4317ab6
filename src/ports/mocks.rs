//! Scripted port implementations for tests
//!
//! `ScriptedLedger` replays pre-programmed signature pages and transactions
//! while recording calls, so pagination and detector behavior can be asserted
//! without a network. The static enrichment stubs return fixed data per mint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::models::{PriceData, SignatureInfo, TokenMetadata, TransactionView};
use crate::ports::enrichment::{MetadataError, MetadataPort, PriceError, PricePort};
use crate::ports::ledger::{LedgerError, LedgerPort};

/// One recorded `list_signatures` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ListCall {
    pub address: String,
    pub before: Option<String>,
    pub until: Option<String>,
    pub limit: usize,
}

/// Ledger stub replaying scripted pages and transactions
#[derive(Debug, Default)]
pub struct ScriptedLedger {
    pages: Arc<Mutex<Vec<Vec<SignatureInfo>>>>,
    transactions: Arc<Mutex<HashMap<String, TransactionView>>>,
    failing_signatures: Arc<Mutex<HashMap<String, String>>>,
    supplies: Arc<Mutex<HashMap<String, f64>>>,
    list_calls: Arc<Mutex<Vec<ListCall>>>,
    fetch_calls: Arc<Mutex<Vec<String>>>,
    next_page: Arc<Mutex<usize>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages returned in order by successive `list_signatures` calls;
    /// exhausted pages return empty.
    pub fn with_signature_pages(self, pages: Vec<Vec<SignatureInfo>>) -> Self {
        *self.pages.lock().unwrap() = pages;
        self
    }

    pub fn with_transaction(self, tx: TransactionView) -> Self {
        self.transactions
            .lock()
            .unwrap()
            .insert(tx.signature.clone(), tx);
        self
    }

    /// Make `fetch_transaction` fail for a given signature
    pub fn with_failing_transaction(self, signature: &str, error: &str) -> Self {
        self.failing_signatures
            .lock()
            .unwrap()
            .insert(signature.to_string(), error.to_string());
        self
    }

    pub fn with_supply(self, mint: &str, supply: f64) -> Self {
        self.supplies
            .lock()
            .unwrap()
            .insert(mint.to_string(), supply);
        self
    }

    /// Rewind page replay (simulates the next polling cycle)
    pub fn reset_pages(&self) {
        *self.next_page.lock().unwrap() = 0;
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerPort for ScriptedLedger {
    async fn list_signatures(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        self.list_calls.lock().unwrap().push(ListCall {
            address: address.to_string(),
            before: before.map(String::from),
            until: until.map(String::from),
            limit,
        });

        let mut next = self.next_page.lock().unwrap();
        let pages = self.pages.lock().unwrap();
        let page = pages.get(*next).cloned().unwrap_or_default();
        *next += 1;
        Ok(page)
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionView>, LedgerError> {
        self.fetch_calls.lock().unwrap().push(signature.to_string());

        if let Some(message) = self.failing_signatures.lock().unwrap().get(signature) {
            return Err(LedgerError::Rpc(message.clone()));
        }
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }

    async fn fetch_token_supply(&self, mint: &str) -> Result<Option<f64>, LedgerError> {
        Ok(self.supplies.lock().unwrap().get(mint).copied())
    }
}

/// Metadata stub with fixed responses per mint; unknown mints resolve empty
#[derive(Debug, Default)]
pub struct StaticMetadata {
    entries: HashMap<String, TokenMetadata>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, mint: &str, name: &str, symbol: &str) -> Self {
        self.entries.insert(
            mint.to_string(),
            TokenMetadata {
                name: Some(name.to_string()),
                symbol: Some(symbol.to_string()),
                uri: None,
            },
        );
        self
    }
}

#[async_trait]
impl MetadataPort for StaticMetadata {
    async fn resolve(&self, mint: &str) -> Result<TokenMetadata, MetadataError> {
        Ok(self.entries.get(mint).cloned().unwrap_or_default())
    }
}

/// Price stub with fixed responses per mint; unknown mints yield no data
#[derive(Debug, Default)]
pub struct StaticPrices {
    entries: HashMap<String, PriceData>,
}

impl StaticPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, mint: &str, price_usd: Option<f64>, market_cap_usd: Option<f64>) -> Self {
        self.entries.insert(
            mint.to_string(),
            PriceData {
                price_usd,
                market_cap_usd,
            },
        );
        self
    }
}

#[async_trait]
impl PricePort for StaticPrices {
    async fn fetch_price(&self, mint: &str) -> Result<PriceData, PriceError> {
        Ok(self.entries.get(mint).cloned().unwrap_or_default())
    }
}
