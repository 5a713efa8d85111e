//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `quote` - The canonical live quote shape (LiveQuote) and resolution hints (QuoteHint)
//! - `history` - Historical OHLCV bars and the period/interval vocabulary
//! - `universe` - Static reference entries for the known symbol universe
//! - `movers` - Gainers/losers response shape

mod history;
mod movers;
mod quote;
mod universe;

pub use history::{HistoricalBar, HistoryRange, HistorySeries, Interval, Period};
pub use movers::MarketMovers;
pub use quote::{LiveQuote, QuoteHint, UNKNOWN_SECTOR};
pub use universe::UniverseEntry;
