//! Solana RPC Ledger Client
//!
//! Implements the ledger port over the blocking `RpcClient`, bridged with
//! `spawn_blocking`. Every call is wrapped in the retry primitive; transaction
//! decoding is version-tolerant (`max_supported_transaction_version = 0`).

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use solana_client::rpc_client::{GetConfirmedSignaturesForAddress2Config, RpcClient};
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiLoadedAddresses, UiMessage,
    UiTransactionEncoding,
};

use crate::domain::models::{SignatureInfo, TokenBalance, TransactionView};
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::retry::{with_backoff, RetryOptions};

/// Ledger client backed by a Solana JSON-RPC node
pub struct RpcLedgerClient {
    client: Arc<RpcClient>,
    retry: RetryOptions,
}

impl RpcLedgerClient {
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(
            rpc_url,
            CommitmentConfig::confirmed(),
        ));
        Self {
            client,
            retry: RetryOptions::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }
}

/// The node reports missing/unconfirmed transactions as errors; those are
/// absence, not failure.
fn is_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not found") || lower.contains("could not find")
}

#[async_trait]
impl LedgerPort for RpcLedgerClient {
    async fn list_signatures(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let address = Pubkey::from_str(address)
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;
        let before = before
            .map(Signature::from_str)
            .transpose()
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;
        let until = until
            .map(Signature::from_str)
            .transpose()
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;

        let entries = with_backoff(&self.retry, || {
            let client = Arc::clone(&self.client);
            async move {
                tokio::task::spawn_blocking(move || {
                    client
                        .get_signatures_for_address_with_config(
                            &address,
                            GetConfirmedSignaturesForAddress2Config {
                                before,
                                until,
                                limit: Some(limit),
                                commitment: Some(CommitmentConfig::confirmed()),
                            },
                        )
                        .map_err(|e| LedgerError::Rpc(e.to_string()))
                })
                .await
                .map_err(|e| LedgerError::Rpc(format!("Task join error: {}", e)))?
            }
        })
        .await?;

        // Entries without a block time are unusable for windowing; drop them
        // silently rather than failing the page.
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry.block_time.map(|block_time| SignatureInfo {
                    signature: entry.signature,
                    slot: entry.slot,
                    block_time,
                })
            })
            .collect())
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionView>, LedgerError> {
        let parsed_signature = Signature::from_str(signature)
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))?;

        let fetched = with_backoff(&self.retry, || {
            let client = Arc::clone(&self.client);
            async move {
                let result = tokio::task::spawn_blocking(move || {
                    client.get_transaction_with_config(
                        &parsed_signature,
                        RpcTransactionConfig {
                            encoding: Some(UiTransactionEncoding::Json),
                            commitment: Some(CommitmentConfig::confirmed()),
                            max_supported_transaction_version: Some(0),
                        },
                    )
                })
                .await
                .map_err(|e| LedgerError::Rpc(format!("Task join error: {}", e)))?;

                match result {
                    Ok(tx) => Ok(Some(tx)),
                    Err(e) => {
                        let message = e.to_string();
                        if is_not_found(&message) {
                            Ok(None)
                        } else {
                            Err(LedgerError::Rpc(message))
                        }
                    }
                }
            }
        })
        .await?;

        Ok(fetched.map(|tx| flatten_transaction(signature, tx)))
    }

    async fn fetch_token_supply(&self, mint: &str) -> Result<Option<f64>, LedgerError> {
        let mint_key = match Pubkey::from_str(mint) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Invalid mint address {}: {}", mint, e);
                return Ok(None);
            }
        };

        let result = with_backoff(&self.retry, || {
            let client = Arc::clone(&self.client);
            async move {
                tokio::task::spawn_blocking(move || {
                    client
                        .get_token_supply(&mint_key)
                        .map_err(|e| LedgerError::Rpc(e.to_string()))
                })
                .await
                .map_err(|e| LedgerError::Rpc(format!("Task join error: {}", e)))?
            }
        })
        .await;

        match result {
            Ok(amount) => Ok(amount.ui_amount),
            Err(e) => {
                // Supply unknown is survivable; the caller treats None as
                // "cannot derive market cap".
                tracing::warn!("Token supply lookup failed for {}: {}", mint, e);
                Ok(None)
            }
        }
    }
}

/// Flatten the encoded RPC transaction into the domain view the classifier
/// consumes. Every optional field maps to an explicit default.
fn flatten_transaction(
    signature: &str,
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> TransactionView {
    let mut view = TransactionView {
        signature: signature.to_string(),
        block_time: tx.block_time,
        ..Default::default()
    };

    if let EncodedTransaction::Json(ui_tx) = &tx.transaction.transaction {
        match &ui_tx.message {
            UiMessage::Raw(raw) => view.account_keys.extend(raw.account_keys.iter().cloned()),
            UiMessage::Parsed(parsed) => view
                .account_keys
                .extend(parsed.account_keys.iter().map(|a| a.pubkey.clone())),
        }
    }

    if let Some(meta) = tx.transaction.meta {
        view.err = meta.err.as_ref().map(|e| format!("{:?}", e));

        if let Some(logs) = Option::<Vec<String>>::from(meta.log_messages) {
            view.log_messages = logs;
        }

        // v0 transactions carry extra keys via address lookup tables
        if let Some(loaded) = Option::<UiLoadedAddresses>::from(meta.loaded_addresses) {
            view.account_keys.extend(loaded.writable);
            view.account_keys.extend(loaded.readonly);
        }

        if let OptionSerializer::Some(balances) = meta.pre_token_balances {
            view.pre_token_balances = balances
                .into_iter()
                .map(|b| TokenBalance {
                    account_index: b.account_index,
                    mint: b.mint,
                    ui_amount: b.ui_token_amount.ui_amount,
                })
                .collect();
        }
        if let OptionSerializer::Some(balances) = meta.post_token_balances {
            view.post_token_balances = balances
                .into_iter()
                .map(|b| TokenBalance {
                    account_index: b.account_index,
                    mint: b.mint,
                    ui_amount: b.ui_token_amount.ui_amount,
                })
                .collect();
        }
    }

    view
}
