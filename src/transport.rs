//! Transport collaborator contract.
//!
//! The scheduler never performs I/O itself. Each admitted request is handed
//! to a [`Transport`] on a spawned task with no scheduler lock held.

use std::future::Future;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{HttpRequest, HttpResponse};

/// Executes a single HTTP request.
///
/// Called at most once per admitted request. Cancellation is best-effort:
/// on bulk cancellation the returned future is dropped.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Adapts an async closure into a [`Transport`].
pub struct FnTransport<F> {
    f: F,
}

impl<F> FnTransport<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, TransportError>> + Send + 'static,
{
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (self.f)(request.clone()).await
    }
}
