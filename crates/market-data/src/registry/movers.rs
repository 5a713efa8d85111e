//! Gainers and losers over cached quotes.

use std::cmp::Ordering;

use crate::models::{LiveQuote, MarketMovers};

/// Number of quotes on each side of [`MarketMovers`].
pub const DEFAULT_TOP_N: usize = 10;

/// Rank quotes by percent change.
///
/// Only priced quotes with a percent change take part. They are sorted by
/// percent change, highest first; gainers are the first `top_n`, losers the
/// last `top_n` of that same ordering (so the biggest loser comes last).
/// With fewer than `2 * top_n` quotes the two sides overlap.
pub fn gainers_losers(quotes: Vec<LiveQuote>, top_n: usize) -> MarketMovers {
    let mut ranked: Vec<LiveQuote> = quotes
        .into_iter()
        .filter(|q| q.has_price() && q.percent_change.is_some())
        .collect();

    ranked.sort_by(|a, b| match (b.percent_change, a.percent_change) {
        (Some(b), Some(a)) => b.cmp(&a),
        _ => Ordering::Equal,
    });

    let gainers = ranked.iter().take(top_n).cloned().collect();
    let losers = ranked[ranked.len().saturating_sub(top_n)..].to_vec();

    MarketMovers { gainers, losers }
}
