//! In-memory TTL cache for resolved quotes.
//!
//! Entries are independent per symbol. Staleness is checked lazily on read
//! and a stale entry is dropped the next time it is read; there is no
//! background sweeper. The cache is an explicit object shared through `Arc`, so tests
//! and separate services can each own one with its own TTL.

mod key_locks;

pub use key_locks::KeyLocks;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

use crate::models::LiveQuote;

/// Default time a resolved quote stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// A quote and the instant it was stored.
#[derive(Clone, Debug)]
struct CacheEntry {
    quote: LiveQuote,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// Symbol-keyed quote cache with a fixed expiry.
pub struct QuoteCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    locks: KeyLocks,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            locks: KeyLocks::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the entries mutex, recovering from poison.
    ///
    /// Entries carry no cross-key invariants, so a panic mid-update can at
    /// worst leave one stale quote behind.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh quote for `key`, if any.
    ///
    /// A stale entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<LiveQuote> {
        let mut entries = self.lock_entries();
        let entry = entries.get(key)?;
        if entry.is_stale(Instant::now(), self.ttl) {
            debug!("Quote cache: '{}' expired", key);
            entries.remove(key);
            return None;
        }
        Some(entry.quote.clone())
    }

    /// Store `quote` under `key`, stamping the current time.
    pub fn set(&self, key: &str, quote: LiveQuote) {
        let entry = CacheEntry {
            quote,
            stored_at: Instant::now(),
        };
        self.lock_entries().insert(key.to_string(), entry);
    }

    /// Serialize resolution of a single key.
    ///
    /// Hold the returned guard across check-fetch-store so concurrent
    /// requests for the same symbol do not fetch twice. Other keys are
    /// unaffected.
    pub async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(key).await
    }

    /// Snapshot of all fresh quotes. Read-only: stale entries are skipped,
    /// not evicted.
    pub fn fresh_quotes(&self) -> Vec<LiveQuote> {
        let now = Instant::now();
        self.lock_entries()
            .values()
            .filter(|entry| !entry.is_stale(now, self.ttl))
            .map(|entry| entry.quote.clone())
            .collect()
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }
}
