//! Response shapes for the metadata JSON-RPC calls
//!
//! Everything optional-by-default: a node answering with a shape we do not
//! expect degrades to "no metadata", never to a deserialization failure.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccountInfoResponse<T> {
    pub result: Option<AccountInfoResult<T>>,
}

#[derive(Debug, Deserialize)]
pub struct AccountInfoResult<T> {
    pub value: Option<T>,
}

/// Account returned under `jsonParsed` encoding
#[derive(Debug, Deserialize)]
pub struct ParsedAccount {
    #[serde(default)]
    pub data: Option<AccountData>,
}

/// `jsonParsed` falls back to a raw base64 tuple for programs the node
/// cannot parse, so both shapes must deserialize.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AccountData {
    Parsed(ParsedAccountData),
    Raw(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
pub struct ParsedAccountData {
    #[serde(default)]
    pub parsed: Option<ParsedMint>,
}

#[derive(Debug, Deserialize)]
pub struct ParsedMint {
    #[serde(default)]
    pub info: Option<MintInfo>,
}

#[derive(Debug, Deserialize)]
pub struct MintInfo {
    #[serde(default)]
    pub extensions: Vec<MintExtension>,
}

#[derive(Debug, Deserialize)]
pub struct MintExtension {
    pub extension: String,
    #[serde(default)]
    pub state: Option<TokenMetadataState>,
}

#[derive(Debug, Deserialize)]
pub struct TokenMetadataState {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
}

/// Account returned under `base64` encoding: data is `[payload, "base64"]`
#[derive(Debug, Deserialize)]
pub struct RawAccount {
    #[serde(default)]
    pub data: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_extension_deserializes() {
        let body = r#"{
            "result": {
                "value": {
                    "data": {
                        "parsed": {
                            "info": {
                                "extensions": [
                                    {"extension": "transferFeeConfig"},
                                    {"extension": "tokenMetadata",
                                     "state": {"name": "Dog", "symbol": "DOG", "uri": "https://x/d.json"}}
                                ]
                            },
                            "type": "mint"
                        },
                        "program": "spl-token-2022"
                    }
                }
            }
        }"#;

        let parsed: AccountInfoResponse<ParsedAccount> = serde_json::from_str(body).unwrap();
        let account = parsed.result.unwrap().value.unwrap();
        match account.data.unwrap() {
            AccountData::Parsed(data) => {
                let info = data.parsed.unwrap().info.unwrap();
                assert_eq!(info.extensions.len(), 2);
                assert_eq!(info.extensions[1].extension, "tokenMetadata");
                assert_eq!(
                    info.extensions[1].state.as_ref().unwrap().symbol.as_deref(),
                    Some("DOG")
                );
            }
            AccountData::Raw(_) => panic!("expected parsed data"),
        }
    }

    #[test]
    fn test_raw_tuple_fallback_deserializes() {
        let body = r#"{"result": {"value": {"data": ["aGVsbG8=", "base64"]}}}"#;
        let parsed: AccountInfoResponse<ParsedAccount> = serde_json::from_str(body).unwrap();
        let account = parsed.result.unwrap().value.unwrap();
        assert!(matches!(account.data, Some(AccountData::Raw(_))));
    }

    #[test]
    fn test_missing_account_is_none() {
        let body = r#"{"result": {"value": null}}"#;
        let parsed: AccountInfoResponse<ParsedAccount> = serde_json::from_str(body).unwrap();
        assert!(parsed.result.unwrap().value.is_none());
    }
}
