//! On-chain token metadata resolution
//!
//! Two tiers over raw JSON-RPC: the Token-2022 `tokenMetadata` mint extension
//! first, then the Metaplex metadata PDA decoded from its fixed binary
//! layout. A token with neither resolves to all-None metadata.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;

use crate::domain::known_programs::TOKEN_METADATA_PROGRAM;
use crate::domain::models::TokenMetadata;
use crate::ports::enrichment::{MetadataError, MetadataPort};
use crate::retry::{with_backoff, RetryOptions};

use super::types::{AccountData, AccountInfoResponse, ParsedAccount, RawAccount};

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Resolves token names and symbols straight from chain state
pub struct OnChainMetadataResolver {
    http: reqwest::Client,
    rpc_url: String,
    retry: RetryOptions,
}

impl OnChainMetadataResolver {
    pub fn new(rpc_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            rpc_url,
            retry: RetryOptions::default(),
        }
    }

    async fn rpc_request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, MetadataError> {
        with_backoff(&self.retry, || async {
            let response = self
                .http
                .post(&self.rpc_url)
                .json(&json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": method,
                    "params": params.clone(),
                }))
                .send()
                .await
                .map_err(|e| MetadataError::Http(e.to_string()))?;

            response
                .json::<T>()
                .await
                .map_err(|e| MetadataError::Parse(e.to_string()))
        })
        .await
    }

    /// Tier 1: the mint account's own `tokenMetadata` extension (Token-2022)
    async fn resolve_token_2022(&self, mint: &str) -> Result<Option<TokenMetadata>, MetadataError> {
        let response: AccountInfoResponse<ParsedAccount> = self
            .rpc_request(
                "getAccountInfo",
                json!([mint, {"encoding": "jsonParsed", "commitment": "confirmed"}]),
            )
            .await?;

        let account = match response.result.and_then(|r| r.value) {
            Some(account) => account,
            None => return Ok(None),
        };
        let parsed = match account.data {
            Some(AccountData::Parsed(data)) => data,
            _ => return Ok(None),
        };
        let extensions = parsed
            .parsed
            .and_then(|p| p.info)
            .map(|i| i.extensions)
            .unwrap_or_default();

        Ok(extensions
            .into_iter()
            .find(|ext| ext.extension == "tokenMetadata")
            .and_then(|ext| ext.state)
            .map(|state| TokenMetadata {
                name: non_empty(state.name),
                symbol: non_empty(state.symbol),
                uri: non_empty(state.uri),
            })
            .filter(|meta| !meta.is_empty()))
    }

    /// Tier 2: the Metaplex metadata PDA for the mint
    async fn resolve_metaplex(&self, mint: &str) -> Result<Option<TokenMetadata>, MetadataError> {
        let pda = match metadata_pda(mint) {
            Some(pda) => pda,
            None => return Ok(None),
        };

        let response: AccountInfoResponse<RawAccount> = self
            .rpc_request(
                "getAccountInfo",
                json!([pda.to_string(), {"encoding": "base64", "commitment": "confirmed"}]),
            )
            .await?;

        let account = match response.result.and_then(|r| r.value) {
            Some(account) => account,
            None => return Ok(None),
        };
        let payload = match account.data.first() {
            Some(payload) => payload,
            None => return Ok(None),
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| MetadataError::Parse(e.to_string()))?;

        Ok(decode_metaplex(&bytes).filter(|meta| !meta.is_empty()))
    }
}

#[async_trait]
impl MetadataPort for OnChainMetadataResolver {
    async fn resolve(&self, mint: &str) -> Result<TokenMetadata, MetadataError> {
        match self.resolve_token_2022(mint).await {
            Ok(Some(metadata)) => return Ok(metadata),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Token-2022 metadata lookup failed for {}: {}", mint, e);
            }
        }

        match self.resolve_metaplex(mint).await {
            Ok(Some(metadata)) => Ok(metadata),
            Ok(None) => Ok(TokenMetadata::default()),
            Err(e) => {
                tracing::warn!("Metaplex metadata lookup failed for {}: {}", mint, e);
                Ok(TokenMetadata::default())
            }
        }
    }
}

/// Derive the Metaplex metadata account address for a mint
fn metadata_pda(mint: &str) -> Option<Pubkey> {
    let program = Pubkey::from_str(TOKEN_METADATA_PROGRAM).ok()?;
    let mint = Pubkey::from_str(mint).ok()?;
    let (pda, _bump) =
        Pubkey::find_program_address(&[b"metadata", program.as_ref(), mint.as_ref()], &program);
    Some(pda)
}

/// Decode the Metaplex metadata account layout: a one-byte key, two 32-byte
/// addresses, then three length-prefixed strings (name, symbol, uri). The
/// strings are allocated at fixed size and NUL-padded on chain.
fn decode_metaplex(data: &[u8]) -> Option<TokenMetadata> {
    let mut offset = 1 + 32 + 32;
    let name = read_prefixed_string(data, &mut offset)?;
    let symbol = read_prefixed_string(data, &mut offset)?;
    let uri = read_prefixed_string(data, &mut offset)?;

    Some(TokenMetadata {
        name: non_empty(Some(name)),
        symbol: non_empty(Some(symbol)),
        uri: non_empty(Some(uri)),
    })
}

fn read_prefixed_string(data: &[u8], offset: &mut usize) -> Option<String> {
    let len_bytes: [u8; 4] = data.get(*offset..*offset + 4)?.try_into().ok()?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    *offset += 4;

    let raw = data.get(*offset..*offset + len)?;
    *offset += len;

    Some(
        String::from_utf8_lossy(raw)
            .trim_end_matches('\0')
            .trim()
            .to_string(),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metaplex_bytes(name: &str, symbol: &str, uri: &str) -> Vec<u8> {
        // Key byte, update authority, mint, then the padded string triplet
        let mut data = vec![4u8];
        data.extend_from_slice(&[0u8; 64]);
        for (value, padded_len) in [(name, 32usize), (symbol, 10), (uri, 200)] {
            data.extend_from_slice(&(padded_len as u32).to_le_bytes());
            let mut field = value.as_bytes().to_vec();
            field.resize(padded_len, 0);
            data.extend_from_slice(&field);
        }
        data
    }

    #[test]
    fn test_decode_metaplex_strips_padding() {
        let data = metaplex_bytes("Dog Coin", "DOG", "https://x/d.json");
        let meta = decode_metaplex(&data).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Dog Coin"));
        assert_eq!(meta.symbol.as_deref(), Some("DOG"));
        assert_eq!(meta.uri.as_deref(), Some("https://x/d.json"));
    }

    #[test]
    fn test_decode_metaplex_empty_fields_become_none() {
        let data = metaplex_bytes("", "", "");
        let meta = decode_metaplex(&data).unwrap();
        assert!(meta.is_empty());
        assert!(meta.uri.is_none());
    }

    #[test]
    fn test_decode_metaplex_truncated_data() {
        assert!(decode_metaplex(&[4u8; 40]).is_none());
        assert!(decode_metaplex(&[]).is_none());
    }

    #[test]
    fn test_metadata_pda_is_deterministic() {
        let mint = "So11111111111111111111111111111111111111112";
        let a = metadata_pda(mint).unwrap();
        let b = metadata_pda(mint).unwrap();
        assert_eq!(a, b);
        assert!(metadata_pda("not-a-mint").is_none());
    }
}
