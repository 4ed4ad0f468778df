//! Scriptable transport for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::error::TransportError;
use crate::request::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Each call blocks until a permit is released, then answers with the url as body.
pub(crate) struct MockTransport {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    permits: Semaphore,
    active: AtomicUsize,
    peak: AtomicUsize,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockTransport {
    /// Calls wait for [`MockTransport::release`].
    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self::with_permits(0))
    }

    /// Calls complete as soon as they are polled.
    pub(crate) fn immediate() -> Arc<Self> {
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

    pub(crate) fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.call_count() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("transport was not called in time");
    }
}

#[async_trait]
impl Transport for MockTransport {
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
            return Err(TransportError::with_status(500, format!("failed: {}", request.url)));
        }
        Ok(HttpResponse::new(200, request.url.clone().into_bytes()))
    }
}
