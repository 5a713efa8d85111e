use serde::{Deserialize, Serialize};

use super::quote::LiveQuote;

/// Top movers computed from cached quotes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMovers {
    pub gainers: Vec<LiveQuote>,
    pub losers: Vec<LiveQuote>,
}
