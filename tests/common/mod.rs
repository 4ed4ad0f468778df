//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tiered_http::{HttpRequest, HttpResponse, ResponseHandle, ScheduleResult, Transport, TransportError};
use tokio::sync::Semaphore;

/// Transport whose calls block until released. Responds with the url as body.
///
/// Mirrors the crate's internal test transport; both lock with `parking_lot`.
pub struct ScriptedTransport {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    permits: Semaphore,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn gated() -> Arc<Self> {
        Arc::new(Self::with_permits(0))
    }

    pub fn immediate() -> Arc<Self> {
        Arc::new(Self::with_permits(Semaphore::MAX_PERMITS))
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            permits: Semaphore::new(permits),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.call_count() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("transport was not called in time");
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().push(request.url.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _active = ActiveGuard(&self.active);

        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::new("transport shut down"))?;
        permit.forget();

        if self.failing.lock().contains(&request.url) {
            return Err(TransportError::with_status(503, format!("unavailable: {}", request.url)));
        }
        Ok(HttpResponse::new(200, request.url.clone().into_bytes()))
    }
}

/// Await a handle, failing the test if it does not resolve within two seconds.
pub async fn resolve(handle: ResponseHandle) -> ScheduleResult {
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("handle did not resolve")
}

/// Poll until `check` holds, for at most two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
