use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::model::FloatInfo;
use super::provider::FloatProvider;
use super::symbol::{lookup_candidates, normalize};

/// Float below this many shares is low float regardless of shares outstanding
pub const LOW_FLOAT_SHARES: f64 = 40_000_000.0;

/// Float below this fraction of shares outstanding is low float
pub const LOW_FLOAT_RATIO: f64 = 0.25;

/// Default lifetime of a cached lookup
pub const DEFAULT_FLOAT_TTL_HOURS: i64 = 6;

/// Decide low-float status from lookup figures.
///
/// `None` when there is nothing to decide on: no info, or neither figure known.
pub fn classify(info: Option<&FloatInfo>) -> Option<bool> {
    let info = info?;
    if info.float_shares.is_none() && info.shares_outstanding.is_none() {
        return None;
    }

    let Some(float_shares) = info.float_shares else {
        return Some(false);
    };
    if float_shares < LOW_FLOAT_SHARES {
        return Some(true);
    }

    let low_ratio = info
        .shares_outstanding
        .filter(|outstanding| *outstanding > 0.0)
        .is_some_and(|outstanding| float_shares / outstanding < LOW_FLOAT_RATIO);
    Some(low_ratio)
}

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: Option<FloatInfo>,
}

/// In-memory float lookup cache keyed by canonical symbol.
///
/// Entries expire lazily once `now - stored_at >= ttl`. Misses are cached
/// as `None` so a failing symbol is not queried again within the TTL.
pub struct FloatCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FloatCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// `Some(value)` for a fresh entry, where `value` may itself be a cached miss
    pub async fn get(&self, symbol: &str) -> Option<Option<FloatInfo>> {
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        entries
            .get(symbol)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn put(&self, symbol: &str, value: Option<FloatInfo>) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            value,
        };
        self.entries.lock().await.insert(symbol.to_string(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Cached, multi-candidate float lookup.
///
/// Provider failures are logged and treated as "not found"; they never
/// reach the caller.
pub struct FloatLookup {
    provider: Arc<dyn FloatProvider>,
    cache: FloatCache,
}

impl FloatLookup {
    pub fn new(provider: Arc<dyn FloatProvider>, cache: FloatCache) -> Self {
        Self { provider, cache }
    }

    pub async fn lookup(&self, symbol: &str) -> Option<FloatInfo> {
        let key = normalize(symbol);
        if let Some(cached) = self.cache.get(&key).await {
            log::debug!("Float cache hit for {key}");
            return cached;
        }

        let mut found = None;
        for candidate in lookup_candidates(&key) {
            match self.provider.fetch(&candidate).await {
                Ok(Some(info)) => {
                    log::debug!("{} answered float lookup for {key} as {candidate}", self.provider.name());
                    found = Some(info);
                    break;
                }
                Ok(None) => log::debug!("No float figures for {candidate}"),
                Err(e) => log::debug!("Float lookup for {candidate} failed: {e}"),
            }
        }

        if found.is_none() {
            log::info!("🔍 No float data for {key}, caching miss");
        }
        self.cache.put(&key, found.clone()).await;
        log::debug!("Float cache holds {} symbols", self.cache.len().await);
        found
    }

    /// Lookup followed by classification
    pub async fn classify(&self, symbol: &str) -> (Option<FloatInfo>, Option<bool>) {
        let info = self.lookup(symbol).await;
        let low_float = classify(info.as_ref());
        (info, low_float)
    }
}
