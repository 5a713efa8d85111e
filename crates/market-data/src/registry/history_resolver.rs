//! Ordered history fallback.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::models::{HistoricalBar, HistoryRange};
use crate::provider::HistoryProvider;

/// Fetches historical bars, trying providers in order.
///
/// If no provider has bars for the requested range, the whole chain is
/// tried once more with [`HistoryRange::fallback`]. Exhaustion yields an
/// empty series, and so does running past the deadline when one is set.
pub struct HistoryResolver {
    providers: Vec<Arc<dyn HistoryProvider>>,
    deadline: Option<Duration>,
}

impl HistoryResolver {
    pub fn new(providers: Vec<Arc<dyn HistoryProvider>>) -> Self {
        Self {
            providers,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub async fn resolve(&self, symbol: &str, range: &HistoryRange) -> Vec<HistoricalBar> {
        let Some(deadline) = self.deadline else {
            return self.resolve_chain(symbol, range).await;
        };
        match tokio::time::timeout(deadline, self.resolve_chain(symbol, range)).await {
            Ok(bars) => bars,
            Err(_) => {
                warn!("Deadline passed while fetching history for {}", symbol);
                Vec::new()
            }
        }
    }

    async fn resolve_chain(&self, symbol: &str, range: &HistoryRange) -> Vec<HistoricalBar> {
        if let Some(bars) = self.fetch_first(symbol, range).await {
            return bars;
        }

        let fallback = HistoryRange::fallback();
        if *range != fallback {
            info!(
                "No history for {} at {} @ {}, retrying with {} @ {}",
                symbol, range.period, range.interval, fallback.period, fallback.interval
            );
            if let Some(bars) = self.fetch_first(symbol, &fallback).await {
                return bars;
            }
        }

        debug!("No history available for {}", symbol);
        Vec::new()
    }

    async fn fetch_first(&self, symbol: &str, range: &HistoryRange) -> Option<Vec<HistoricalBar>> {
        for provider in &self.providers {
            match provider.fetch_history(symbol, range).await {
                Some(bars) if !bars.is_empty() => {
                    debug!("{} bars for {} from {}", bars.len(), symbol, provider.id());
                    return Some(bars);
                }
                _ => debug!("{} had no history for {}", provider.id(), symbol),
            }
        }
        None
    }
}
