//! Quote orchestration.
//!
//! This module wires providers, the cache and the universe together:
//! - [`QuoteResolver`]: cache-first, strictly ordered provider fallback
//! - [`FanOut`]: bounded-concurrency resolution of many symbols
//! - [`HistoryResolver`]: ordered history fallback with one range retry
//! - [`movers`]: gainers/losers over cached quotes

mod fan_out;
mod history_resolver;
pub mod movers;
mod quote_resolver;

pub use fan_out::{FanOut, DEFAULT_FETCH_CONCURRENCY};
pub use movers::{gainers_losers, DEFAULT_TOP_N};
pub use history_resolver::HistoryResolver;
pub use quote_resolver::QuoteResolver;

#[cfg(test)]
pub(crate) mod test_support {
    //! Stub providers shared by the registry tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tokio::sync::Semaphore;

    use crate::models::LiveQuote;
    use crate::provider::QuoteProvider;

    /// Returns a fixed price (or nothing) after `delay` and counts calls.
    pub struct FixedProvider {
        pub id: &'static str,
        pub price: Option<Decimal>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl FixedProvider {
        pub fn new(id: &'static str, price: Option<Decimal>) -> Arc<Self> {
            Self::delayed(id, price, Duration::ZERO)
        }

        pub fn delayed(id: &'static str, price: Option<Decimal>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id,
                price,
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for FixedProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.price.map(|price| LiveQuote::new(symbol, price))
        }
    }

    /// Prices every symbol at 1, sleeping longer for `slow_symbol`.
    pub struct SlowProvider {
        pub slow_symbol: &'static str,
        pub delay: Duration,
    }

    #[async_trait]
    impl QuoteProvider for SlowProvider {
        fn id(&self) -> &'static str {
            "SLOW"
        }

        async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
            if symbol == self.slow_symbol {
                tokio::time::sleep(self.delay).await;
            }
            Some(LiveQuote::new(symbol, Decimal::ONE))
        }
    }

    /// Blocks every call until a permit is released, tracking peak
    /// concurrency.
    pub struct GatedProvider {
        pub release: Arc<Semaphore>,
        pub in_flight: AtomicUsize,
        pub peak: AtomicUsize,
    }

    impl GatedProvider {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                release: Arc::new(Semaphore::new(0)),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuoteProvider for GatedProvider {
        fn id(&self) -> &'static str {
            "GATED"
        }

        async fn fetch_quote(&self, symbol: &str) -> Option<LiveQuote> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Some(LiveQuote::new(symbol, Decimal::ONE))
        }
    }
}
