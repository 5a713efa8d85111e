//! Twelve Data market data provider.
//!
//! - Live quotes via `/quote`
//! - Historical bars via `/time_series`
//!
//! Symbols carrying a known market suffix are sent as the bare ticker plus
//! an `exchange` parameter (`RELIANCE.NS` → `symbol=RELIANCE&exchange=NSE`).
//! Numeric fields arrive as strings; errors arrive in-band as
//! `{"status": "error", "code": ..., "message": ...}`.
//!
//! API documentation: https://twelvedata.com/docs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{build_client, get_text, parse_json, DEFAULT_PROVIDER_TIMEOUT};
use super::parse::Numeric;
use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, HistoryRange, Interval, LiveQuote};
use crate::provider::{absorb, HistoryProvider, QuoteProvider};
use crate::symbol::SymbolNormalizer;

const BASE_URL: &str = "https://api.twelvedata.com";
const PROVIDER_ID: &str = "TWELVE_DATA";

/// Largest `outputsize` the time series endpoint accepts.
const MAX_OUTPUT_SIZE: u64 = 5000;

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteResponse {
    status: Option<String>,
    code: Option<i64>,
    message: Option<String>,
    name: Option<String>,
    /// Present on some plans; `close` is the regular-session equivalent
    price: Option<Numeric>,
    close: Option<Numeric>,
    change: Option<Numeric>,
    percent_change: Option<Numeric>,
    volume: Option<Numeric>,
    sector: Option<String>,
    market_cap: Option<Numeric>,
    pe: Option<Numeric>,
    eps: Option<Numeric>,
}

/// Response from /time_series
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimeSeriesResponse {
    status: Option<String>,
    code: Option<i64>,
    message: Option<String>,
    values: Vec<TimeSeriesValue>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
    #[serde(default)]
    volume: Option<Numeric>,
}

// ============================================================================
// TwelveDataProvider
// ============================================================================

/// Twelve Data quote and history provider.
pub struct TwelveDataProvider {
    client: Client,
    api_key: String,
    normalizer: SymbolNormalizer,
}

impl TwelveDataProvider {
    /// Create a provider with the default per-request timeout.
    pub fn new(api_key: String, normalizer: SymbolNormalizer) -> Result<Self, MarketDataError> {
        Self::with_timeout(api_key, normalizer, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: String,
        normalizer: SymbolNormalizer,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
            normalizer,
        })
    }

    /// Turn an in-band `status: error` into a typed error.
    fn check_api_error(
        status: &Option<String>,
        code: Option<i64>,
        message: &Option<String>,
        symbol: &str,
    ) -> Result<(), MarketDataError> {
        if status.as_deref() != Some("error") {
            return Ok(());
        }
        let message = message.clone().unwrap_or_default();
        match code {
            Some(404) | Some(400) => Err(MarketDataError::SymbolNotFound(format!(
                "{}: {}",
                symbol, message
            ))),
            Some(429) => Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            }),
            _ => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            }),
        }
    }

    /// Map a /quote response onto the common shape.
    fn to_live_quote(symbol: &str, response: QuoteResponse) -> Result<LiveQuote, MarketDataError> {
        Self::check_api_error(&response.status, response.code, &response.message, symbol)?;

        let price = response
            .price
            .as_ref()
            .or(response.close.as_ref())
            .and_then(Numeric::to_decimal)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            })?;

        let mut quote = LiveQuote::new(symbol, price);
        if let Some(name) = response.name.filter(|n| !n.trim().is_empty()) {
            quote.name = name;
        }
        if let Some(sector) = response.sector.filter(|s| !s.trim().is_empty()) {
            quote.sector = sector;
        }
        quote.change = response.change.as_ref().and_then(Numeric::to_decimal);
        quote.percent_change = response.percent_change.as_ref().and_then(Numeric::to_decimal);
        quote.volume = response.volume.as_ref().and_then(Numeric::to_volume);
        quote.market_cap = response.market_cap.as_ref().and_then(Numeric::to_decimal);
        quote.pe_ratio = response.pe.as_ref().and_then(Numeric::to_decimal);
        quote.eps = response.eps.as_ref().and_then(Numeric::to_decimal);
        Ok(quote)
    }

    /// Map a /time_series response onto ascending bars.
    fn to_bars(
        symbol: &str,
        response: TimeSeriesResponse,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        Self::check_api_error(&response.status, response.code, &response.message, symbol)?;

        let mut bars: Vec<HistoricalBar> = response
            .values
            .into_iter()
            .filter_map(|value| {
                let Some(date) = parse_datetime(&value.datetime) else {
                    warn!("Twelve Data: unparseable datetime '{}'", value.datetime);
                    return None;
                };
                Some(HistoricalBar {
                    date,
                    open: value.open.to_decimal()?,
                    high: value.high.to_decimal()?,
                    low: value.low.to_decimal()?,
                    close: value.close.to_decimal()?,
                    volume: value.volume.as_ref().and_then(Numeric::to_volume),
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        // Newest first on the wire
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(bars)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<LiveQuote, MarketDataError> {
        let (ticker, exchange) = self.normalizer.split(symbol);
        let mut params = vec![("symbol", ticker), ("apikey", self.api_key.as_str())];
        if let Some(exchange) = exchange {
            params.push(("exchange", exchange));
        }

        let url = format!("{}/quote", BASE_URL);
        let text = get_text(&self.client, PROVIDER_ID, &url, &params, &self.api_key).await?;
        let response: QuoteResponse = parse_json(PROVIDER_ID, &text)?;
        Self::to_live_quote(symbol, response)
    }

    async fn time_series(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        let interval = twelve_data_interval(range.interval).ok_or_else(|| {
            MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: format!("{} ({} interval unsupported)", symbol, range.interval),
            }
        })?;
        let output_size = output_size(range, Utc::now()).to_string();

        let (ticker, exchange) = self.normalizer.split(symbol);
        let mut params = vec![
            ("symbol", ticker),
            ("interval", interval),
            ("outputsize", output_size.as_str()),
            ("apikey", self.api_key.as_str()),
        ];
        if let Some(exchange) = exchange {
            params.push(("exchange", exchange));
        }

        let url = format!("{}/time_series", BASE_URL);
        let text = get_text(&self.client, PROVIDER_ID, &url, &params, &self.api_key).await?;
        let response: TimeSeriesResponse = parse_json(PROVIDER_ID, &text)?;
        let bars = Self::to_bars(symbol, response)?;

        debug!(
            "Twelve Data: fetched {} bars for {} ({} @ {})",
            bars.len(),
            symbol,
            range.period,
            range.interval
        );
        Ok(bars)
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
        absorb(PROVIDER_ID, symbol, self.latest_quote(symbol).await)
    }
}

#[async_trait]
impl HistoryProvider for TwelveDataProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Option<Vec<HistoricalBar>> {
        absorb(PROVIDER_ID, symbol, self.time_series(symbol, range).await)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Twelve Data spelling of an interval, if it has one.
fn twelve_data_interval(interval: Interval) -> Option<&'static str> {
    match interval {
        Interval::OneMinute => Some("1min"),
        Interval::FiveMinutes => Some("5min"),
        Interval::FifteenMinutes => Some("15min"),
        Interval::ThirtyMinutes => Some("30min"),
        Interval::SixtyMinutes | Interval::OneHour => Some("1h"),
        Interval::OneDay => Some("1day"),
        Interval::OneWeek => Some("1week"),
        Interval::OneMonth => Some("1month"),
        Interval::TwoMinutes
        | Interval::NinetyMinutes
        | Interval::FiveDays
        | Interval::ThreeMonths => None,
    }
}

/// Upper bound on bars needed to cover the period at the given interval.
fn output_size(range: &HistoryRange, today: DateTime<Utc>) -> u64 {
    let minutes = u64::from(range.period.approx_days(today)) * 1_440;
    let bars = minutes.div_ceil(u64::from(range.interval.minutes()));
    bars.clamp(1, MAX_OUTPUT_SIZE)
}

/// Twelve Data sends `YYYY-MM-DD` for daily bars and `YYYY-MM-DD HH:MM:SS`
/// for intraday ones.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_local_datetime(&dt).single();
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
}

// ============================================================================
// Tests
// ============================================================================
