//! Cache-first provider fallback for a single symbol.

use std::sync::Arc;

use log::debug;

use crate::cache::QuoteCache;
use crate::models::{LiveQuote, QuoteHint};
use crate::provider::QuoteProvider;

/// Resolves one normalized symbol to a [`LiveQuote`].
///
/// Providers are tried strictly in the order given; the first priced quote
/// wins. When every provider comes back empty the result is
/// [`LiveQuote::empty`], never an error. Either outcome is cached, so a dead
/// symbol is not re-fetched until its entry expires.
pub struct QuoteResolver {
    providers: Vec<Arc<dyn QuoteProvider>>,
    cache: Arc<QuoteCache>,
}

impl QuoteResolver {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, cache: Arc<QuoteCache>) -> Self {
        Self { providers, cache }
    }

    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    /// Provider ids in priority order.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub async fn resolve(&self, symbol: &str) -> LiveQuote {
        self.resolve_with_hint(symbol, &QuoteHint::default()).await
    }

    /// Resolve `symbol`, overlaying the caller's name/sector hint.
    ///
    /// The per-key lock is held across check-fetch-store.
    pub async fn resolve_with_hint(&self, symbol: &str, hint: &QuoteHint) -> LiveQuote {
        let _guard = self.cache.lock_key(symbol).await;

        if let Some(cached) = self.cache.get(symbol) {
            debug!("Cache hit for {}", symbol);
            return cached.with_hint(hint);
        }

        let quote = match self.fetch_first(symbol).await {
            Some(quote) => quote,
            None => {
                debug!("All providers exhausted for {}", symbol);
                LiveQuote::empty(symbol)
            }
        }
        .with_hint(hint);

        self.cache.set(symbol, quote.clone());
        quote
    }

    async fn fetch_first(&self, symbol: &str) -> Option<LiveQuote> {
        for provider in &self.providers {
            match provider.fetch_quote(symbol).await {
                Some(mut quote) if quote.has_price() => {
                    debug!("{} resolved by {}", symbol, provider.id());
                    quote.symbol = symbol.to_string();
                    return Some(quote);
                }
                Some(_) => debug!("{} returned no price for {}", provider.id(), symbol),
                None => debug!("{} had nothing for {}", provider.id(), symbol),
            }
        }
        None
    }
}
