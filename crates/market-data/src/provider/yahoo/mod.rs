//! Yahoo Finance market data provider.
//!
//! Uses the chart API through `yahoo_finance_api`; no key required.
//!
//! - Live quotes are derived from daily bars: the last close is the price
//!   and the bar before it is the previous close. Thinly traded symbols can
//!   have empty short windows, so the lookup widens `2d` → `5d` → `10d`
//!   before giving up.
//! - Historical bars come straight from the chart range request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::http::DEFAULT_PROVIDER_TIMEOUT;
use super::parse::decimal_from_f64;
use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, HistoryRange, LiveQuote};
use crate::provider::{absorb, HistoryProvider, QuoteProvider};

const PROVIDER_ID: &str = "YAHOO";

/// Widening lookback windows for the live quote, all at daily interval.
const LIVE_WINDOWS: [&str; 3] = ["2d", "5d", "10d"];

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance quote and history provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    timeout: Duration,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_timeout(DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self { connector, timeout })
    }

    // ========================================================================
    // Chart Requests
    // ========================================================================

    /// Fetch bars for `range` at `interval`, bounded by the provider timeout.
    async fn chart(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        let request = self.connector.get_quote_range(symbol, interval, range);
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            })?
            .map_err(|e| Self::map_error(symbol, e))?;

        let quotes = response.quotes().map_err(|e| Self::map_error(symbol, e))?;

        let mut bars: Vec<HistoricalBar> = quotes.into_iter().filter_map(Self::to_bar).collect();
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(bars)
    }

    fn map_error(symbol: &str, error: yahoo::YahooError) -> MarketDataError {
        if matches!(error, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
            MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// Convert a Yahoo bar, dropping rows with missing or non-finite prices.
    fn to_bar(quote: yahoo::Quote) -> Option<HistoricalBar> {
        let date: DateTime<Utc> = match Utc.timestamp_opt(quote.timestamp as i64, 0).single() {
            Some(ts) => ts,
            None => {
                warn!("Invalid Yahoo timestamp: {}", quote.timestamp);
                return None;
            }
        };

        Some(HistoricalBar {
            date,
            open: decimal_from_f64(quote.open)?,
            high: decimal_from_f64(quote.high)?,
            low: decimal_from_f64(quote.low)?,
            close: decimal_from_f64(quote.close)?,
            volume: Some(quote.volume),
        })
    }

    // ========================================================================
    // Quote Derivation
    // ========================================================================

    /// Derive a live quote from ascending daily bars.
    ///
    /// With a single bar the previous close is the close itself, so the
    /// change is zero.
    fn quote_from_bars(
        symbol: &str,
        bars: &[HistoricalBar],
    ) -> Result<LiveQuote, MarketDataError> {
        let last = bars.last().ok_or_else(|| MarketDataError::NoData {
            provider: PROVIDER_ID.to_string(),
            symbol: symbol.to_string(),
        })?;

        if last.close.is_zero() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        let prev_close = if bars.len() >= 2 {
            bars[bars.len() - 2].close
        } else {
            last.close
        };
        let change = last.close - prev_close;
        let percent_change = if prev_close.is_zero() {
            Decimal::ZERO
        } else {
            (change / prev_close * Decimal::ONE_HUNDRED).round_dp(4)
        };

        let mut quote = LiveQuote::new(symbol, last.close);
        quote.change = Some(change);
        quote.percent_change = Some(percent_change);
        quote.volume = last.volume;
        Ok(quote)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<LiveQuote, MarketDataError> {
        for window in LIVE_WINDOWS {
            match self.chart(symbol, "1d", window).await {
                Ok(bars) if !bars.is_empty() => {
                    debug!("Yahoo: {} resolved from {} window", symbol, window);
                    return Self::quote_from_bars(symbol, &bars);
                }
                Ok(_) | Err(MarketDataError::NoData { .. }) => {
                    debug!("Yahoo: no bars for {} in {} window", symbol, window);
                }
                Err(e) => return Err(e),
            }
        }

        Err(MarketDataError::NoData {
            provider: PROVIDER_ID.to_string(),
            symbol: symbol.to_string(),
        })
    }

    async fn history(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        let bars = self
            .chart(symbol, range.interval.as_str(), range.period.as_str())
            .await?;

        if bars.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        debug!(
            "Yahoo: fetched {} bars for {} ({} @ {})",
            bars.len(),
            symbol,
            range.period,
            range.interval
        );
        Ok(bars)
    }
}

// ============================================================================
// Provider Implementations
// ============================================================================

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
        absorb(PROVIDER_ID, symbol, self.latest_quote(symbol).await)
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Option<Vec<HistoricalBar>> {
        absorb(PROVIDER_ID, symbol, self.history(symbol, range).await)
    }
}

// ============================================================================
// Tests
// ============================================================================
