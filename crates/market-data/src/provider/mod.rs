//! Quote and history provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` and `HistoryProvider` traits every source implements
//! - Shared HTTP and payload-parsing helpers
//! - Concrete providers (Alpha Vantage, Twelve Data, Finnhub, Yahoo)
//!
//! # Failure model
//!
//! Provider internals work with `Result<_, MarketDataError>` so each failure
//! keeps its cause for logging. The trait methods collapse every failure
//! (transport, non-2xx, timeout, malformed payload, "no data") into `None`.
//! Callers never see provider errors; they see absence and move on to the
//! next provider.

mod http;
mod parse;
mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod twelve_data;
pub mod yahoo;

pub use http::DEFAULT_PROVIDER_TIMEOUT;
pub use traits::{HistoryProvider, QuoteProvider};

pub(crate) use traits::absorb;
