//! Cancellable future returned by asynchronous calls.
//!
//! Each call owns a small state machine: `Pending` moves exactly once to
//! `Resolved`, `Rejected` or `Cancelled`. Whoever wins that transition writes
//! the inbound activity line, so a cancelled call can never surface a late
//! success and every call logs exactly one outcome.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLog, CallId};
use crate::error::{Result, SellsyError};

/// Lifecycle of one asynchronous call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallState {
    Pending = 0,
    Resolved = 1,
    Rejected = 2,
    Cancelled = 3,
}

impl CallState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CallState::Resolved,
            2 => CallState::Rejected,
            3 => CallState::Cancelled,
            _ => CallState::Pending,
        }
    }
}

/// Write the inbound line for a settled call
pub(crate) fn log_settled(activity: &dyn ActivityLog, call_id: &CallId, result: &Result<Value>) {
    match result {
        Ok(payload) => activity.log_inbound(call_id, &payload.to_string()),
        Err(e) => {
            tracing::warn!(call_id = %call_id, error = %e, "call failed");
            activity.log_inbound(call_id, &e.to_string());
        }
    }
}

/// State shared between a [`CallFuture`] and its [`CancelHandle`]s
struct Shared {
    call_id: CallId,
    state: AtomicU8,
    token: CancellationToken,
    activity: Arc<dyn ActivityLog>,
}

impl Shared {
    fn state(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Try to leave `Pending`; only the first caller succeeds
    fn transition(&self, to: CallState) -> bool {
        self.state
            .compare_exchange(
                CallState::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn cancel(&self) -> bool {
        if !self.transition(CallState::Cancelled) {
            return false;
        }
        self.token.cancel();
        self.activity.log_inbound(&self.call_id, "call cancelled");
        true
    }
}

/// Handle that can cancel an asynchronous call from anywhere.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Request cancellation. Returns `false` if the call had already settled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state() == CallState::Cancelled
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("call_id", &self.shared.call_id)
            .field("state", &self.shared.state())
            .finish()
    }
}

type BoxedCall = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Future of an asynchronous call.
///
/// Resolves with the `response` payload or a [`SellsyError`]. After
/// [`cancel`](CallFuture::cancel) it always resolves with
/// [`SellsyError::Cancelled`]. Dropping an unfinished future cancels it.
pub struct CallFuture {
    shared: Arc<Shared>,
    inner: Option<BoxedCall>,
}

impl CallFuture {
    /// Wrap a call in flight. The inner future is abandoned as soon as the
    /// call is cancelled.
    pub(crate) fn new<F, Fut>(call_id: CallId, activity: Arc<dyn ActivityLog>, make: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let call = make(token.clone());
        let guarded = {
            let token = token.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(SellsyError::Cancelled),
                    result = call => result,
                }
            }
        };

        CallFuture {
            shared: Arc::new(Shared {
                call_id,
                state: AtomicU8::new(CallState::Pending as u8),
                token,
                activity,
            }),
            inner: Some(Box::pin(guarded)),
        }
    }

    /// A call that failed before anything was sent
    pub(crate) fn failed(call_id: CallId, activity: Arc<dyn ActivityLog>, error: SellsyError) -> Self {
        CallFuture::new(call_id, activity, move |_| std::future::ready(Err(error)))
    }

    /// Correlation id used in the activity log
    pub fn call_id(&self) -> &CallId {
        &self.shared.call_id
    }

    pub fn state(&self) -> CallState {
        self.shared.state()
    }

    /// Request cancellation. Returns `false` if the call had already settled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Get a handle that can cancel this call from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Await the call and unmarshal the payload into the target type
    pub async fn apply<T>(self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let payload = self.await?;
        Ok(serde_json::from_value(payload)?)
    }
}

impl Future for CallFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.shared.state() == CallState::Cancelled {
            self.inner = None;
            return Poll::Ready(Err(SellsyError::Cancelled));
        }

        let inner = match self.inner.as_mut() {
            Some(inner) => inner,
            None => panic!("CallFuture polled after completion"),
        };
        let result = match inner.as_mut().poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };
        self.inner = None;

        let to = if result.is_ok() {
            CallState::Resolved
        } else {
            CallState::Rejected
        };
        if !self.shared.transition(to) {
            return Poll::Ready(Err(SellsyError::Cancelled));
        }

        log_settled(&*self.shared.activity, &self.shared.call_id, &result);
        Poll::Ready(result)
    }
}

impl Drop for CallFuture {
    fn drop(&mut self) {
        if self.inner.is_some() {
            self.shared.cancel();
        }
    }
}

impl std::fmt::Debug for CallFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallFuture")
            .field("call_id", &self.shared.call_id)
            .field("state", &self.shared.state())
            .finish()
    }
}
