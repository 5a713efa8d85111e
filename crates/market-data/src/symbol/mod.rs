//! Ticker canonicalization.
//!
//! Raw tickers from callers (`reliance`, ` tcs.ns `) are mapped onto the
//! symbol form every provider and the cache key on (`RELIANCE.NS`). A symbol
//! "has a market suffix" when it ends with one of the known exchange
//! suffixes; anything else gets the configured default suffix appended.

use std::borrow::Cow;

/// Default market suffix (National Stock Exchange of India).
pub const DEFAULT_MARKET_SUFFIX: &str = ".NS";

/// Exchange suffix and the exchange code providers expect for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketSuffix {
    /// Suffix appended to the ticker, including the dot (e.g. ".NS").
    pub suffix: Cow<'static, str>,
    /// Exchange code used by providers that take it as a separate parameter.
    pub exchange: Cow<'static, str>,
}

impl MarketSuffix {
    pub const fn borrowed(suffix: &'static str, exchange: &'static str) -> Self {
        Self {
            suffix: Cow::Borrowed(suffix),
            exchange: Cow::Borrowed(exchange),
        }
    }
}

/// Suffixes recognized out of the box.
pub const KNOWN_SUFFIXES: [MarketSuffix; 2] = [
    MarketSuffix::borrowed(".NS", "NSE"),
    MarketSuffix::borrowed(".BO", "BSE"),
];

/// Canonicalizes raw tickers into provider-addressable symbols.
#[derive(Clone, Debug)]
pub struct SymbolNormalizer {
    default_suffix: String,
    known: Vec<MarketSuffix>,
}

impl Default for SymbolNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MARKET_SUFFIX)
    }
}

impl SymbolNormalizer {
    /// Create a normalizer appending `default_suffix` to bare tickers.
    ///
    /// The default suffix is always treated as known, even if it is not one
    /// of [`KNOWN_SUFFIXES`].
    pub fn new(default_suffix: &str) -> Self {
        let mut default_suffix = default_suffix.trim().to_ascii_uppercase();
        if !default_suffix.is_empty() && !default_suffix.starts_with('.') {
            default_suffix.insert(0, '.');
        }

        let mut known = KNOWN_SUFFIXES.to_vec();
        if !default_suffix.is_empty() && !known.iter().any(|k| k.suffix == default_suffix) {
            let exchange = default_suffix.trim_start_matches('.').to_string();
            known.push(MarketSuffix {
                suffix: Cow::Owned(default_suffix.clone()),
                exchange: Cow::Owned(exchange),
            });
        }

        Self {
            default_suffix,
            known,
        }
    }

    pub fn default_suffix(&self) -> &str {
        &self.default_suffix
    }

    /// Trim, upper-case and append the default suffix when none is present.
    ///
    /// Never fails; empty input maps to empty output, which callers reject.
    pub fn normalize(&self, raw: &str) -> String {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() || self.has_market_suffix(&symbol) {
            return symbol;
        }
        format!("{}{}", symbol, self.default_suffix)
    }

    /// Whether `symbol` already ends with a known market suffix.
    pub fn has_market_suffix(&self, symbol: &str) -> bool {
        self.market_of(symbol).is_some()
    }

    /// Split a normalized symbol into bare ticker and exchange code.
    ///
    /// Symbols without a known suffix come back whole with no exchange.
    pub fn split<'a>(&self, symbol: &'a str) -> (&'a str, Option<&str>) {
        match self.market_of(symbol) {
            Some(market) => (
                &symbol[..symbol.len() - market.suffix.len()],
                Some(market.exchange.as_ref()),
            ),
            None => (symbol, None),
        }
    }

    fn market_of(&self, symbol: &str) -> Option<&MarketSuffix> {
        let upper = symbol.to_ascii_uppercase();
        self.known
            .iter()
            .find(|k| upper.len() > k.suffix.len() && upper.ends_with(k.suffix.as_ref()))
    }
}
