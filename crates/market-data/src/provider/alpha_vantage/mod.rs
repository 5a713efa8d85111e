//! Alpha Vantage market data provider.
//!
//! Live quotes come from the `GLOBAL_QUOTE` function. Alpha Vantage reports
//! most failures in-band with HTTP 200 (`Error Message`, `Note`,
//! `Information`) and answers unknown symbols with an empty `Global Quote`
//! object, so both cases are checked before the payload is trusted.
//!
//! API documentation: https://www.alphavantage.co/documentation/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{build_client, get_text, parse_json, DEFAULT_PROVIDER_TIMEOUT};
use super::parse::{parse_decimal, parse_volume};
use crate::errors::MarketDataError;
use crate::models::LiveQuote;
use crate::provider::{absorb, QuoteProvider};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the GLOBAL_QUOTE function.
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// The quote body; every value is a string.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Alpha Vantage quote provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    /// Create a provider with the default per-request timeout.
    pub fn new(api_key: String) -> Result<Self, MarketDataError> {
        Self::with_timeout(api_key, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, MarketDataError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
        })
    }

    /// Check for API-level errors reported with a 200 status.
    fn check_api_error(response: &GlobalQuoteResponse) -> Result<(), MarketDataError> {
        if let Some(ref msg) = response.error_message {
            if msg.contains("Invalid API call") || msg.contains("not found") {
                return Err(MarketDataError::SymbolNotFound(msg.clone()));
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        // "Note" and "Information" usually mean the free-tier quota is spent
        for msg in [&response.note, &response.information].into_iter().flatten() {
            if msg.contains("API call frequency") || msg.contains("rate limit") {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage notice: {}", msg);
        }

        Ok(())
    }

    /// Map a GLOBAL_QUOTE response onto the common shape.
    fn to_live_quote(
        symbol: &str,
        response: GlobalQuoteResponse,
    ) -> Result<LiveQuote, MarketDataError> {
        Self::check_api_error(&response)?;

        let global = response.global_quote.unwrap_or_default();
        let price = global
            .price
            .as_deref()
            .and_then(parse_decimal)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            })?;

        let mut quote = LiveQuote::new(symbol, price);
        quote.change = global.change.as_deref().and_then(parse_decimal);
        quote.percent_change = global.change_percent.as_deref().and_then(parse_decimal);
        quote.volume = global.volume.as_deref().and_then(parse_volume);
        Ok(quote)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<LiveQuote, MarketDataError> {
        let params = [
            ("function", "GLOBAL_QUOTE"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        let text = get_text(&self.client, PROVIDER_ID, BASE_URL, &params, &self.api_key).await?;
        let response: GlobalQuoteResponse = parse_json(PROVIDER_ID, &text)?;
        let quote = Self::to_live_quote(symbol, response)?;
        debug!("Alpha Vantage: {} priced at {:?}", symbol, quote.price);
        Ok(quote)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
        absorb(PROVIDER_ID, symbol, self.latest_quote(symbol).await)
    }
}

// ============================================================================
// Tests
// ============================================================================
