//! Provider trait definitions.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, HistoryRange, LiveQuote};

/// A source of live quotes.
///
/// Implementations must not fail past this boundary: any transport error,
/// malformed payload or provider-reported "no data" is `None`. A quote is
/// only returned when it carries a non-zero price.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use stockdash_market_data::{LiveQuote, QuoteProvider};
///
/// struct FixedPrice;
///
/// #[async_trait]
/// impl QuoteProvider for FixedPrice {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
///         Some(LiveQuote::new(symbol, rust_decimal::Decimal::ONE_HUNDRED))
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for a normalized symbol.
    async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote>;
}

/// A source of historical OHLCV bars.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Fetch bars for a normalized symbol, ordered by date ascending.
    ///
    /// `None` when the provider has nothing for this symbol/range, including
    /// when it cannot express the requested interval.
    async fn fetch_history(&self, symbol: &str, range: &HistoryRange)
        -> Option<Vec<HistoricalBar>>;
}

/// Collapse a provider result into an option, logging the failure.
pub(crate) fn absorb<T>(
    provider: &str,
    symbol: &str,
    result: Result<T, MarketDataError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_transient() => {
            warn!("{} failed for {}: {}", provider, symbol, e);
            None
        }
        Err(e) => {
            debug!("{} had no data for {}: {}", provider, symbol, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_passes_values_through() {
        assert_eq!(absorb("TEST", "FOO.NS", Ok::<_, MarketDataError>(7)), Some(7));
    }

    #[test]
    fn test_absorb_collapses_errors() {
        let timeout: Result<u8, _> = Err(MarketDataError::Timeout {
            provider: "TEST".to_string(),
        });
        assert_eq!(absorb("TEST", "FOO.NS", timeout), None);

        let missing: Result<u8, _> = Err(MarketDataError::SymbolNotFound("FOO.NS".to_string()));
        assert_eq!(absorb("TEST", "FOO.NS", missing), None);
    }
}
