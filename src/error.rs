//! Error types surfaced through response handles.
//!
//! Every variant is `Clone`: a single outcome is delivered to every waiter
//! coalesced on the same cache key.

use thiserror::Error;

/// Failure reported by the transport collaborator.
///
/// Carried to callers verbatim; the scheduler never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// HTTP status, when the failure came from a response rather than the connection.
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { message: message.into(), status: Some(status) }
    }
}

/// Errors delivered through a [`ResponseHandle`](crate::scheduler::ResponseHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Scheduler closed")]
    SchedulerClosed,
}

impl SchedulerError {
    /// Returns true if the request was discarded by bulk cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the failure originated in the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Short label used for metrics and span fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Cancelled => "cancelled",
            Self::SchedulerClosed => "closed",
        }
    }
}
