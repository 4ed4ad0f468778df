//! Single-flight request coalescing and result caching.
//!
//! Each cache key maps to either one in-flight execution shared by every
//! concurrent caller, or a completed response served without touching the
//! inner scheduler. Failures are fanned out to every waiter and leave no
//! entry behind. There is no expiry at this layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use super::handle::{send, ResponseHandle, ResponseTx, ScheduleResult};
use super::{Priority, Scheduler, SchedulerStats, SpeculativeScheduler};
use crate::error::SchedulerError;
use crate::request::{CacheKey, HttpRequest, HttpResponse};
use crate::telemetry;

/// Cached response for a completed request.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub response: Arc<HttpResponse>,
    pub cached_at: Instant,
}

/// Configuration for the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheConfig {
    /// Completed-entry cap; the oldest is evicted beyond it. Zero means unbounded.
    pub max_entries: usize,
}

/// Counters and sizes for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub completed: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
}

enum CacheEntry {
    InFlight { flight: u64, waiters: Vec<ResponseTx> },
    Completed(CachedResponse),
}

struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    max_entries: usize,
    next_flight: u64,
    closed: bool,
    hits: u64,
    misses: u64,
    coalesced: u64,
}

impl CacheState {
    fn completed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, CacheEntry::Completed(_)))
            .count()
    }

    fn insert_completed(&mut self, key: CacheKey, response: Arc<HttpResponse>) {
        if self.max_entries > 0 && self.completed_count() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry::Completed(CachedResponse { response, cached_at: Instant::now() }),
        );
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self.find_oldest_key() {
            self.entries.remove(&oldest_key);
        }
    }

    fn find_oldest_key(&self) -> Option<CacheKey> {
        self.entries
            .iter()
            .filter_map(|(k, v)| match v {
                CacheEntry::Completed(c) => Some((k, c.cached_at)),
                CacheEntry::InFlight { .. } => None,
            })
            .min_by_key(|(_, cached_at)| *cached_at)
            .map(|(k, _)| *k)
    }

    /// Remove every in-flight entry, returning their waiters.
    fn take_in_flight(&mut self) -> Vec<ResponseTx> {
        let keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, v)| matches!(v, CacheEntry::InFlight { .. }))
            .map(|(k, _)| *k)
            .collect();
        let mut waiters = Vec::new();
        for key in keys {
            if let Some(CacheEntry::InFlight { waiters: w, .. }) = self.entries.remove(&key) {
                waiters.extend(w);
            }
        }
        waiters
    }
}

/// Decorator adding single-flight coalescing and result caching to any scheduler.
pub struct CachingHttpScheduler<S> {
    inner: Arc<S>,
    cache: Arc<Mutex<CacheState>>,
}

impl<S: Scheduler + 'static> CachingHttpScheduler<S> {
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    pub fn with_config(inner: S, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            cache: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                max_entries: config.max_entries,
                next_flight: 1,
                closed: false,
                hits: 0,
                misses: 0,
                coalesced: 0,
            })),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Look up a completed response without scheduling anything.
    pub fn cached(&self, request: &HttpRequest) -> Option<CachedResponse> {
        match self.cache.lock().entries.get(&request.cache_key()) {
            Some(CacheEntry::Completed(c)) => Some(c.clone()),
            _ => None,
        }
    }

    /// Drop the completed entry for `request`. In-flight executions are untouched.
    pub fn invalidate(&self, request: &HttpRequest) -> bool {
        self.invalidate_key(&request.cache_key())
    }

    pub fn invalidate_key(&self, key: &CacheKey) -> bool {
        let mut cache = self.cache.lock();
        if matches!(cache.entries.get(key), Some(CacheEntry::Completed(_))) {
            cache.entries.remove(key);
            debug!(key = %key.short(), "cache entry invalidated");
            return true;
        }
        false
    }

    /// Drop every completed entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut cache = self.cache.lock();
        let before = cache.entries.len();
        cache.entries.retain(|_, v| matches!(v, CacheEntry::InFlight { .. }));
        before - cache.entries.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        let completed = cache.completed_count();
        CacheStats {
            completed,
            in_flight: cache.entries.len() - completed,
            hits: cache.hits,
            misses: cache.misses,
            coalesced: cache.coalesced,
        }
    }
}

/// Fail drained in-flight waiters with `Cancelled`.
fn fail_waiters(waiters: Vec<ResponseTx>) {
    if !waiters.is_empty() {
        info!(waiters = waiters.len(), "cancelling in-flight cache entries");
    }
    for tx in waiters {
        send(tx, Err(SchedulerError::Cancelled));
    }
}

/// Settle an in-flight entry, unless bulk cancellation already removed it.
fn resolve(cache: &Mutex<CacheState>, key: CacheKey, flight: u64, outcome: ScheduleResult) {
    let waiters = {
        let mut state = cache.lock();
        let current = matches!(
            state.entries.get(&key),
            Some(CacheEntry::InFlight { flight: f, .. }) if *f == flight
        );
        if !current {
            return;
        }
        let Some(CacheEntry::InFlight { waiters, .. }) = state.entries.remove(&key) else {
            return;
        };
        if let Ok(response) = &outcome {
            state.insert_completed(key, Arc::clone(response));
        }
        waiters
    };
    debug!(key = %key.short(), waiters = waiters.len(), ok = outcome.is_ok(), "in-flight entry resolved");
    for tx in waiters {
        send(tx, outcome.clone());
    }
}

impl<S: Scheduler + 'static> Scheduler for CachingHttpScheduler<S> {
    fn schedule(&self, request: HttpRequest, priority: Priority) -> ResponseHandle {
        let key = request.cache_key();
        let (tx, handle) = ResponseHandle::channel();
        // The inner schedule happens under the cache lock so a concurrent
        // `cancel_all` sees either no entry or an entry whose work is queued.
        let mut cache = self.cache.lock();
        if cache.closed {
            return ResponseHandle::ready(Err(SchedulerError::SchedulerClosed));
        }
        let CacheState { entries, next_flight, hits, misses, coalesced, .. } = &mut *cache;
        let flight = match entries.get_mut(&key) {
            Some(CacheEntry::Completed(cached)) => {
                *hits += 1;
                telemetry::record_cache_hit();
                debug!(key = %key.short(), "cache hit");
                send(tx, Ok(Arc::clone(&cached.response)));
                return handle;
            }
            Some(CacheEntry::InFlight { waiters, .. }) => {
                *coalesced += 1;
                telemetry::record_cache_coalesced();
                debug!(key = %key.short(), waiters = waiters.len() + 1, "joined in-flight request");
                waiters.push(tx);
                return handle;
            }
            None => {
                *misses += 1;
                telemetry::record_cache_miss();
                let flight = *next_flight;
                *next_flight += 1;
                entries.insert(key, CacheEntry::InFlight { flight, waiters: vec![tx] });
                flight
            }
        };
        let upstream = self.inner.schedule(request, priority);
        drop(cache);

        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let outcome = upstream.await;
            resolve(&cache, key, flight, outcome);
        });
        handle
    }

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn cancel_all(&self) {
        let waiters = {
            let mut cache = self.cache.lock();
            let waiters = cache.take_in_flight();
            self.inner.cancel_all();
            waiters
        };
        fail_waiters(waiters);
    }

    fn close(&self) {
        let waiters = {
            let mut cache = self.cache.lock();
            cache.closed = true;
            let waiters = cache.take_in_flight();
            self.inner.close();
            waiters
        };
        fail_waiters(waiters);
    }

    fn stats(&self) -> SchedulerStats {
        self.inner.stats()
    }
}

impl<S: SpeculativeScheduler + 'static> SpeculativeScheduler for CachingHttpScheduler<S> {
    fn reset_limit(&self, bytes: u64) {
        self.inner.reset_limit(bytes);
    }

    fn remaining_budget(&self) -> u64 {
        self.inner.remaining_budget()
    }
}

#[cfg(test)]
#[path = "caching_tests.rs"]
mod tests;
