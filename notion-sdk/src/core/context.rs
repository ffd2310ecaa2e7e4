//! Per-call deadline and cancellation
//!
//! A `RequestContext` is passed to every pipeline call. Only the transport
//! exchange observes it: once the deadline passes or the cancel handle fires,
//! the in-flight exchange is dropped and the call fails with a transport
//! error.

use std::future::{self, Future};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::TransportFailure;

/// Deadline and cancellation signal for one call
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl RequestContext {
    /// A context that never expires and cannot be cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire the call `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Expire the call at `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort the call when `handle` is cancelled
    pub fn with_cancel(mut self, handle: &CancelHandle) -> Self {
        self.cancel = Some(handle.subscribe());
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Drive `fut` unless the context fires first
    pub(crate) async fn run<Fut>(&self, fut: Fut) -> Result<Fut::Output, TransportFailure>
    where
        Fut: Future,
    {
        if self.is_cancelled() {
            return Err(TransportFailure::Cancelled);
        }

        tokio::select! {
            biased;
            _ = wait_cancelled(self.cancel.clone()) => Err(TransportFailure::Cancelled),
            _ = wait_deadline(self.deadline) => Err(TransportFailure::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}

async fn wait_cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel else {
        return future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        // Sender dropped without cancelling: the call can no longer be cancelled
        if rx.changed().await.is_err() {
            return future::pending().await;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}

/// Cancels every context created from it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal; in-flight and future calls observing it are aborted
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Create a context observing this handle
    pub fn context(&self) -> RequestContext {
        RequestContext::background().with_cancel(self)
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
