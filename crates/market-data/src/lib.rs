//! Stockdash Market Data Crate
//!
//! Resolves live quotes and price history for dashboard consumers from
//! several third-party providers.
//!
//! # Overview
//!
//! - Symbols are normalized to an exchange-suffixed form (`TCS` → `TCS.NS`)
//! - Providers are tried in a fixed priority order; the first priced quote wins
//! - Results, including "nothing found", are cached per symbol for a TTL
//! - Batches are resolved concurrently behind a bounded admission gate
//! - Provider failures never reach the caller: an unresolved symbol is an
//!   in-band quote with `price: null` and sector `UNKNOWN`
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  StockService    | --> | SymbolNormalizer |
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |     FanOut       | --> |    Universe      |  (sector filter)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  QuoteResolver   | <-> |   QuoteCache     |  (TTL, per-key locks)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |  QuoteProvider   |  (Alpha Vantage, Twelve Data, Finnhub, Yahoo)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`LiveQuote`] - Common quote shape returned by every endpoint
//! - [`HistorySeries`] - Symbol plus historical OHLCV bars
//! - [`MarketMovers`] - Gainers and losers over cached quotes
//! - [`UniverseEntry`] - One symbol of the static universe

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod service;
pub mod symbol;
pub mod universe;

// Re-export all public types from models
pub use models::{
    HistoricalBar, HistoryRange, HistorySeries, Interval, LiveQuote, MarketMovers, Period,
    QuoteHint, UniverseEntry, UNKNOWN_SECTOR,
};

pub use cache::{QuoteCache, DEFAULT_CACHE_TTL};
pub use errors::MarketDataError;
pub use registry::{FanOut, HistoryResolver, QuoteResolver, DEFAULT_FETCH_CONCURRENCY};
pub use service::{StockService, StockServiceTrait};
pub use symbol::{SymbolNormalizer, DEFAULT_MARKET_SUFFIX};
pub use universe::{Universe, UniverseQuery, DEFAULT_UNIVERSE_LIMIT, MAX_UNIVERSE_LIMIT};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::twelve_data::TwelveDataProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{HistoryProvider, QuoteProvider, DEFAULT_PROVIDER_TIMEOUT};
