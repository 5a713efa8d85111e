//! Stock quote service.
//!
//! Entry point for the HTTP layer. Validates and normalizes caller input,
//! then delegates to the resolver, fan-out and history chains. Only input
//! validation fails; provider trouble always ends in an in-band empty quote
//! or an empty series.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::errors::{MarketDataError, Result};
use crate::models::{HistoryRange, HistorySeries, LiveQuote, MarketMovers, QuoteHint};
use crate::registry::{gainers_losers, FanOut, HistoryResolver, QuoteResolver, DEFAULT_TOP_N};
use crate::symbol::SymbolNormalizer;
use crate::universe::{Universe, UniverseQuery, MAX_UNIVERSE_LIMIT};

/// Operations behind the `/stocks` endpoints.
#[async_trait]
pub trait StockServiceTrait: Send + Sync {
    /// Quote for a single raw symbol.
    async fn live_quote(&self, symbol: &str) -> Result<LiveQuote>;

    /// Quotes for a comma-separated list, in input order.
    async fn live_quotes(&self, symbols: &str) -> Result<Vec<LiveQuote>>;

    /// Quotes for a filtered slice of the universe.
    async fn universe_quotes(&self, query: UniverseQuery) -> Result<Vec<LiveQuote>>;

    /// Historical bars; `None` selects the default period/interval.
    async fn history(
        &self,
        symbol: &str,
        period: Option<&str>,
        interval: Option<&str>,
    ) -> Result<HistorySeries>;

    /// Top movers among currently cached quotes. Never fetches.
    fn gainers_losers(&self) -> MarketMovers;

    /// Number of symbols in the loaded universe.
    fn universe_size(&self) -> usize;
}

pub struct StockService {
    normalizer: SymbolNormalizer,
    resolver: Arc<QuoteResolver>,
    fan_out: FanOut,
    history: HistoryResolver,
    universe: Universe,
}

impl StockService {
    pub fn new(
        normalizer: SymbolNormalizer,
        fan_out: FanOut,
        history: HistoryResolver,
        universe: Universe,
    ) -> Self {
        Self {
            normalizer,
            resolver: fan_out.resolver().clone(),
            fan_out,
            history,
            universe,
        }
    }

    fn normalize_required(&self, raw: &str) -> Result<String> {
        let symbol = self.normalizer.normalize(raw);
        if symbol.is_empty() {
            return Err(MarketDataError::invalid_input("Symbol is required."));
        }
        Ok(symbol)
    }

    fn validate_query(&self, query: &UniverseQuery) -> Result<()> {
        if !(1..=MAX_UNIVERSE_LIMIT).contains(&query.limit) {
            return Err(MarketDataError::invalid_input(format!(
                "limit must be between 1 and {}.",
                MAX_UNIVERSE_LIMIT
            )));
        }

        if let Some(sector) = query.sector.as_deref() {
            if sector.trim().is_empty() {
                return Err(MarketDataError::invalid_input("sector must not be blank."));
            }
            if !self.universe.is_empty() && !self.universe.has_sector(sector) {
                return Err(MarketDataError::invalid_input(format!(
                    "Unknown sector '{}'.",
                    sector.trim()
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StockServiceTrait for StockService {
    async fn live_quote(&self, symbol: &str) -> Result<LiveQuote> {
        let symbol = self.normalize_required(symbol)?;
        Ok(self.fan_out.resolve_one(&symbol, QuoteHint::default()).await)
    }

    async fn live_quotes(&self, symbols: &str) -> Result<Vec<LiveQuote>> {
        let requests: Vec<(String, QuoteHint)> = symbols
            .split(',')
            .map(|raw| self.normalizer.normalize(raw))
            .filter(|symbol| !symbol.is_empty())
            .map(|symbol| (symbol, QuoteHint::default()))
            .collect();

        if requests.is_empty() {
            return Err(MarketDataError::invalid_input("No valid symbols provided."));
        }

        debug!("Resolving batch of {} symbols", requests.len());
        Ok(self.fan_out.resolve_many(requests).await)
    }

    async fn universe_quotes(&self, query: UniverseQuery) -> Result<Vec<LiveQuote>> {
        self.validate_query(&query)?;
        if self.universe.is_empty() {
            return Ok(Vec::new());
        }

        let requests: Vec<(String, QuoteHint)> = self
            .universe
            .filter(&query)
            .into_iter()
            .map(|entry| {
                let hint = QuoteHint::new(Some(entry.name), Some(entry.sector));
                (entry.symbol, hint)
            })
            .collect();

        debug!(
            "Resolving {} universe symbols (sector: {:?})",
            requests.len(),
            query.sector
        );
        Ok(self.fan_out.resolve_many(requests).await)
    }

    async fn history(
        &self,
        symbol: &str,
        period: Option<&str>,
        interval: Option<&str>,
    ) -> Result<HistorySeries> {
        let symbol = self.normalize_required(symbol)?;
        let range = HistoryRange::parse(period, interval)?;
        let data = self.history.resolve(&symbol, &range).await;
        Ok(HistorySeries { symbol, data })
    }

    fn gainers_losers(&self) -> MarketMovers {
        gainers_losers(self.resolver.cache().fresh_quotes(), DEFAULT_TOP_N)
    }

    fn universe_size(&self) -> usize {
        self.universe.len()
    }
}
