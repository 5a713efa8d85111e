//! Finnhub market data provider.
//!
//! Live quotes via the /quote endpoint. Finnhub answers unknown symbols with
//! a 200 and an all-zero body rather than an error, so a zero current price
//! is treated as "no data".
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, get_text, parse_json, DEFAULT_PROVIDER_TIMEOUT};
use super::parse::decimal_from_f64;
use crate::errors::MarketDataError;
use crate::models::LiveQuote;
use crate::provider::{absorb, QuoteProvider};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    // Note: h, l, o, pc and t exist but the live shape has no use for them
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub quote provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Result<Self, MarketDataError> {
        Self::with_timeout(api_key, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, MarketDataError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
        })
    }

    /// Map a /quote body onto the common shape.
    fn to_live_quote(symbol: &str, body: &str) -> Result<LiveQuote, MarketDataError> {
        // Finnhub reports auth and quota problems as {"error": "..."}
        if let Ok(ErrorResponse {
            error: Some(message),
        }) = serde_json::from_str::<ErrorResponse>(body)
        {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        let response: QuoteResponse = parse_json(PROVIDER_ID, body)?;

        let price = response
            .c
            .and_then(decimal_from_f64)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| {
                MarketDataError::SymbolNotFound(format!(
                    "Symbol not found or no trading data: {}",
                    symbol
                ))
            })?;

        let mut quote = LiveQuote::new(symbol, price);
        quote.change = response.d.and_then(decimal_from_f64);
        quote.percent_change = response.dp.and_then(decimal_from_f64);
        // /quote carries no volume
        Ok(quote)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<LiveQuote, MarketDataError> {
        let params = [("symbol", symbol), ("token", self.api_key.as_str())];
        let url = format!("{}/quote", BASE_URL);
        let text = get_text(&self.client, PROVIDER_ID, &url, &params, &self.api_key).await?;

        let quote = Self::to_live_quote(symbol, &text)?;
        debug!("Finnhub: {} priced at {:?}", symbol, quote.price);
        Ok(quote)
    }
}

// ============================================================================
// QuoteProvider Implementation
// ============================================================================

#[async_trait]
impl QuoteProvider for FinnhubProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        let provider = FinnhubProvider::new("test_key".to_string()).unwrap();
        assert_eq!(provider.id(), "FINNHUB");
    }

    #[test]
    fn test_quote_response_parsing() {
        let json = r#"{
            "c": 150.25,
            "d": 1.50,
            "dp": 1.01,
            "h": 152.00,
            "l": 148.50,
            "o": 149.00,
            "pc": 148.75,
            "t": 1704067200
        }"#;

        let quote = FinnhubProvider::to_live_quote("INFY.NS", json).unwrap();
        assert_eq!(quote.symbol, "INFY.NS");
        assert_eq!(quote.price, Some(dec!(150.25)));
        assert_eq!(quote.change, Some(dec!(1.5)));
        assert_eq!(quote.percent_change, Some(dec!(1.01)));
        assert!(quote.volume.is_none());
    }

    #[test]
    fn test_zero_quote_is_not_found() {
        let json = r#"{"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0}"#;
        let err = FinnhubProvider::to_live_quote("NOPE.NS", json).unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[test]
    fn test_error_body() {
        let json = r#"{"error": "You don't have access to this resource."}"#;
        let err = FinnhubProvider::to_live_quote("FOO.NS", json).unwrap_err();
        assert!(matches!(err, MarketDataError::ProviderError { .. }));
    }

    #[test]
    fn test_malformed_body() {
        let err = FinnhubProvider::to_live_quote("FOO.NS", "<html>").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidPayload { .. }));
    }
}
