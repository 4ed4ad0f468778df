//! Completion handles returned by `schedule`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::SchedulerError;
use crate::request::HttpResponse;

/// Outcome delivered to every waiter.
pub type ScheduleResult = Result<Arc<HttpResponse>, SchedulerError>;

/// Sender half held by the scheduler or cache until the outcome is known.
pub(crate) type ResponseTx = oneshot::Sender<ScheduleResult>;

/// Future resolving to the outcome of a scheduled request.
///
/// If the producing side is dropped without answering, the handle resolves
/// with [`SchedulerError::Cancelled`]. Dropping the handle does not cancel
/// the request.
#[must_use = "a response handle does nothing unless awaited"]
#[derive(Debug)]
pub struct ResponseHandle {
    rx: oneshot::Receiver<ScheduleResult>,
}

impl ResponseHandle {
    pub(crate) fn channel() -> (ResponseTx, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A handle that is already resolved.
    pub(crate) fn ready(result: ScheduleResult) -> Self {
        let (tx, handle) = Self::channel();
        send(tx, result);
        handle
    }

    /// Take the outcome without waiting, if it is already available.
    ///
    /// Once this returns `Some`, the handle is spent and must not be awaited.
    pub fn try_result(&mut self) -> Option<ScheduleResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(SchedulerError::Cancelled)),
        }
    }
}

impl Future for ResponseHandle {
    type Output = ScheduleResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SchedulerError::Cancelled)))
    }
}

/// Deliver an outcome. A dropped handle is not an error.
pub(crate) fn send(tx: ResponseTx, result: ScheduleResult) {
    let _ = tx.send(result);
}
