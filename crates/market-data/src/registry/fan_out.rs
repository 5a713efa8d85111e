//! Bounded-concurrency resolution of many symbols.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};

use super::QuoteResolver;
use crate::models::{LiveQuote, QuoteHint};

/// Default number of symbols resolved concurrently.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;

/// Resolves a list of symbols with at most `limit` in flight.
///
/// The admission gate is shared by every call on the same `FanOut`, so the
/// bound holds across concurrent requests too.
///
/// With a deadline set, symbols still unresolved when it passes come back
/// as empty quotes. Their tasks keep running detached and store whatever
/// they find in the cache for the next caller.
pub struct FanOut {
    resolver: Arc<QuoteResolver>,
    gate: Arc<Semaphore>,
    limit: usize,
    deadline: Option<Duration>,
}

impl FanOut {
    /// A `limit` of zero is raised to one.
    pub fn new(resolver: Arc<QuoteResolver>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            resolver,
            gate: Arc::new(Semaphore::new(limit)),
            limit,
            deadline: None,
        }
    }

    /// Bound each `resolve_many` call to `deadline` of wall time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn resolver(&self) -> &Arc<QuoteResolver> {
        &self.resolver
    }

    /// Resolve every request; the output is in input order.
    ///
    /// One task is spawned per symbol and admitted through the gate. A task
    /// that panics yields an empty quote for its symbol only.
    pub async fn resolve_many(&self, requests: Vec<(String, QuoteHint)>) -> Vec<LiveQuote> {
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let handles: Vec<_> = requests
            .into_iter()
            .map(|(symbol, hint)| {
                let resolver = self.resolver.clone();
                let gate = self.gate.clone();
                let fallback = LiveQuote::empty(symbol.as_str()).with_hint(&hint);
                let handle = tokio::spawn(async move {
                    // The gate is never closed, so acquire only fails if it is dropped.
                    let _permit = gate.acquire_owned().await.ok();
                    resolver.resolve_with_hint(&symbol, &hint).await
                });
                (handle, fallback)
            })
            .collect();

        let mut quotes = Vec::with_capacity(handles.len());
        for (handle, fallback) in handles {
            let joined = match deadline {
                Some(at) => match timeout_at(at, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!("Deadline passed before {} resolved", fallback.symbol);
                        quotes.push(fallback);
                        continue;
                    }
                },
                None => handle.await,
            };
            match joined {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    warn!("Resolution task for {} failed: {}", fallback.symbol, e);
                    quotes.push(fallback);
                }
            }
        }
        quotes
    }

    /// Resolve a single symbol under the same gate and deadline.
    pub async fn resolve_one(&self, symbol: &str, hint: QuoteHint) -> LiveQuote {
        let fallback = LiveQuote::empty(symbol).with_hint(&hint);
        self.resolve_many(vec![(symbol.to_string(), hint)])
            .await
            .pop()
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QuoteCache;
    use crate::provider::QuoteProvider;
    use crate::registry::test_support::{FixedProvider, GatedProvider, SlowProvider};
    use rust_decimal_macros::dec;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fan_out(providers: Vec<Arc<dyn QuoteProvider>>, limit: usize) -> FanOut {
        let resolver = QuoteResolver::new(providers, Arc::new(QuoteCache::default()));
        FanOut::new(Arc::new(resolver), limit)
    }

    fn requests(symbols: &[&str]) -> Vec<(String, QuoteHint)> {
        symbols
            .iter()
            .map(|s| (s.to_string(), QuoteHint::default()))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_order_survives_slow_symbol() {
        let slow = Arc::new(SlowProvider {
            slow_symbol: "B.NS",
            delay: Duration::from_secs(5),
        });
        let fan_out = fan_out(vec![slow], 10);

        let quotes = fan_out.resolve_many(requests(&["A.NS", "B.NS", "C.NS"])).await;
        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, ["A.NS", "B.NS", "C.NS"]);
        assert!(quotes.iter().all(|q| q.has_price()));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let gated = GatedProvider::new();
        let fan_out = Arc::new(fan_out(vec![gated.clone()], 2));

        let task = {
            let fan_out = fan_out.clone();
            tokio::spawn(async move {
                fan_out
                    .resolve_many(requests(&["A.NS", "B.NS", "C.NS", "D.NS", "E.NS"]))
                    .await
            })
        };

        while gated.in_flight.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // Give the remaining tasks a chance to (wrongly) get through.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gated.in_flight.load(Ordering::SeqCst), 2);

        gated.release.add_permits(5);
        let quotes = task.await.unwrap();

        assert_eq!(quotes.len(), 5);
        assert_eq!(gated.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_one_symbol_failing_does_not_affect_others() {
        let priced = fan_out(vec![FixedProvider::new("A", Some(dec!(7)))], 3);
        let quotes = priced.resolve_many(requests(&["X.NS", "Y.NS"])).await;
        assert!(quotes.iter().all(|q| q.price == Some(dec!(7))));

        let empty = fan_out(vec![FixedProvider::new("A", None)], 3);
        let quotes = empty.resolve_many(requests(&["X.NS", "Y.NS"])).await;
        assert!(quotes.iter().all(|q| q.price.is_none()));
    }

    #[tokio::test]
    async fn test_hints_reach_each_symbol() {
        let fan_out = fan_out(vec![FixedProvider::new("A", Some(dec!(1)))], 2);
        let quotes = fan_out
            .resolve_many(vec![
                ("A.NS".to_string(), QuoteHint::new(Some("Alpha".into()), None)),
                ("B.NS".to_string(), QuoteHint::new(Some("Beta".into()), None)),
            ])
            .await;
        assert_eq!(quotes[0].name, "Alpha");
        assert_eq!(quotes[1].name, "Beta");
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_symbols_share_one_provider_call() {
        let provider = FixedProvider::delayed("A", Some(dec!(3)), Duration::from_secs(1));
        let fan_out = fan_out(vec![provider.clone()], 10);

        let quotes = fan_out
            .resolve_many(requests(&["X.NS", "X.NS", "X.NS", "X.NS", "X.NS"]))
            .await;

        assert_eq!(quotes.len(), 5);
        assert!(quotes.iter().all(|q| q.price == Some(dec!(3))));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_empty_for_unfinished_symbols() {
        let slow = Arc::new(SlowProvider {
            slow_symbol: "B.NS",
            delay: Duration::from_secs(60),
        });
        let fan_out = fan_out(vec![slow], 10).with_deadline(Duration::from_secs(5));

        let started = Instant::now();
        let quotes = fan_out.resolve_many(requests(&["A.NS", "B.NS", "C.NS"])).await;
        assert!(started.elapsed() < Duration::from_secs(6));

        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, ["A.NS", "B.NS", "C.NS"]);
        assert!(quotes[0].has_price());
        assert!(!quotes[1].has_price());
        assert!(quotes[2].has_price());

        // The detached task still finishes and fills the cache.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let cached = fan_out.resolver().cache().get("B.NS").unwrap();
        assert!(cached.has_price());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_one_honours_deadline() {
        let slow = Arc::new(SlowProvider {
            slow_symbol: "B.NS",
            delay: Duration::from_secs(60),
        });
        let fan_out = fan_out(vec![slow], 1).with_deadline(Duration::from_secs(5));

        let quote = fan_out
            .resolve_one("B.NS", QuoteHint::new(Some("Beta".into()), None))
            .await;
        assert_eq!(quote.symbol, "B.NS");
        assert_eq!(quote.name, "Beta");
        assert!(!quote.has_price());
    }

    #[test]
    fn test_zero_limit_is_raised() {
        let fan_out = fan_out(Vec::new(), 0);
        assert_eq!(fan_out.limit(), 1);
    }

    #[tokio::test]
    async fn test_empty_request_list() {
        let fan_out = fan_out(Vec::new(), 4);
        assert!(fan_out.resolve_many(Vec::new()).await.is_empty());
    }
}
