//! Span utilities for dispatched requests.

use tracing::{info_span, Span};

use crate::request::HttpRequest;
use crate::scheduler::Priority;

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for creating standardized request spans.
pub struct RequestSpan;

impl RequestSpan {
    /// Create a span for one transport execution.
    ///
    /// `status` and `error.message` are filled in by [`SpanExt::record_result`].
    pub fn new(request_id: u64, priority: Priority, request: &HttpRequest) -> Span {
        info_span!(
            "http_request",
            request_id,
            priority = priority.as_str(),
            method = request.method.as_str(),
            url = %request.url,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
