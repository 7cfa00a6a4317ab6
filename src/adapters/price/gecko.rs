//! GeckoTerminal price client
//!
//! One client for both authenticated and anonymous use; the minimum spacing
//! between requests is wider without an API key. Numeric fields arrive as
//! decimal strings and parse leniently, with malformed values degrading to
//! None rather than failing the token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::domain::models::PriceData;
use crate::ports::enrichment::{PriceError, PricePort};
use crate::retry::{with_backoff, RetryOptions};

const BASE_URL: &str = "https://api.geckoterminal.com/api/v2";
const REQUEST_TIMEOUT_SECS: u64 = 15;
/// Request spacing with an API key
const KEYED_MIN_INTERVAL: Duration = Duration::from_millis(500);
/// Request spacing on the anonymous tier
const ANONYMOUS_MIN_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    attributes: Option<TokenAttributes>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenAttributes {
    price_usd: Option<String>,
    market_cap_usd: Option<String>,
    fdv_usd: Option<String>,
}

/// Token price lookups against the GeckoTerminal public API
pub struct GeckoTerminalClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    retry: RetryOptions,
}

impl GeckoTerminalClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(BASE_URL.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let min_interval = if api_key.is_some() {
            KEYED_MIN_INTERVAL
        } else {
            ANONYMOUS_MIN_INTERVAL
        };
        Self {
            http,
            base_url,
            api_key,
            min_interval,
            last_request: Mutex::new(None),
            retry: RetryOptions::with_max_retries(2),
        }
    }

    /// Space requests out to stay under the API's rate limit
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn request_token(&self, mint: &str) -> Result<PriceData, PriceError> {
        let url = format!("{}/networks/solana/tokens/{}", self.base_url, mint);

        with_backoff(&self.retry, || async {
            self.throttle().await;

            let mut request = self.http.get(&url).header("accept", "application/json");
            if let Some(key) = &self.api_key {
                request = request.header("x-cg-pro-api-key", key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| PriceError::Http(e.to_string()))?;

            let status = response.status();
            // The API answers 404 for tokens it has never indexed; that is a
            // valid "no data" outcome, not a failure.
            if status.as_u16() == 404 {
                return Ok(PriceData::default());
            }
            if !status.is_success() {
                return Err(PriceError::Status(status.as_u16()));
            }

            let body: TokenResponse = response
                .json()
                .await
                .map_err(|e| PriceError::Parse(e.to_string()))?;

            let attributes = body
                .data
                .and_then(|d| d.attributes)
                .unwrap_or_default();

            let market_cap_usd = parse_decimal(attributes.market_cap_usd.as_deref())
                .or_else(|| parse_decimal(attributes.fdv_usd.as_deref()));

            Ok(PriceData {
                price_usd: parse_decimal(attributes.price_usd.as_deref()),
                market_cap_usd,
            })
        })
        .await
    }
}

#[async_trait]
impl PricePort for GeckoTerminalClient {
    async fn fetch_price(&self, mint: &str) -> Result<PriceData, PriceError> {
        self.request_token(mint).await
    }
}

/// Lenient decimal-string parsing; anything malformed becomes None
fn parse_decimal(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
