//! Deferred results handed out by [`ResultQueue::next`](crate::ResultQueue::next).

use crate::error::QueueError;
use crossbeam_utils::sync::{Parker, Unparker};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// What a producer can hand to the consumer: one item, the end of the
/// stream, or an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The next item in order.
    Item(T),
    /// No more items will arrive.
    End,
    /// The producer failed.
    Error(E),
}

impl<T, E> Outcome<T, E> {
    /// Maps the outcome to what the consumer sees.
    pub fn into_result(self) -> Result<Option<T>, QueueError<E>> {
        match self {
            Self::Item(item) => Ok(Some(item)),
            Self::End => Ok(None),
            Self::Error(err) => Err(QueueError::Upstream(err)),
        }
    }

    /// Returns `true` for `End` and `Error`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Item(_))
    }
}

enum State<T, E> {
    /// Resolved when the handle was created.
    Ready(Outcome<T, E>),
    /// Waiting for the producer to resolve the registered waiter.
    Waiting(oneshot::Receiver<Outcome<T, E>>),
    /// Already returned its result.
    Done,
}

/// Handle for one outstanding `next()` call.
///
/// Resolves to `Ok(Some(item))`, `Ok(None)` at end-of-stream, or
/// `Err(QueueError::Upstream(e))`. Await it from async code or block on it
/// with [`wait_timeout`](Next::wait_timeout) from a plain thread.
///
/// Dropping an unresolved handle abandons the wait: an item pushed
/// afterwards goes back into the queue's buffer instead of being lost, and
/// the next `next()` call is allowed.
#[must_use = "a Next handle does nothing unless awaited or waited on"]
pub struct Next<T, E> {
    state: State<T, E>,
}

// Fields are never pinned structurally.
impl<T, E> Unpin for Next<T, E> {}

impl<T, E> Next<T, E> {
    pub(crate) fn ready(outcome: Outcome<T, E>) -> Self {
        Self {
            state: State::Ready(outcome),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Outcome<T, E>>) -> Self {
        Self {
            state: State::Waiting(rx),
        }
    }

    /// Returns `true` if the result was available when `next()` returned.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Blocks the current thread until the result arrives or `timeout` passes.
    ///
    /// Does not need an async runtime. On timeout the handle is dropped and
    /// `QueueError::Timeout` is returned; the queue itself is left as it was.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<Option<T>, QueueError<E>> {
        let parker = Parker::new();
        let waker = Waker::from(Arc::new(ThreadWaker(parker.unparker().clone())));
        let mut cx = Context::from_waker(&waker);

        if let Poll::Ready(result) = Pin::new(&mut self).poll(&mut cx) {
            return result;
        }

        // `None` when the timeout is too large to be represented: wait without a deadline.
        let deadline = Instant::now().checked_add(timeout);

        loop {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::debug!(?timeout, "blocking next() timed out");
                        return Err(QueueError::Timeout(timeout));
                    }
                    parker.park_timeout(deadline - now);
                }
                None => parker.park(),
            }

            if let Poll::Ready(result) = Pin::new(&mut self).poll(&mut cx) {
                return result;
            }
        }
    }
}

impl<T, E> Future for Next<T, E> {
    type Output = Result<Option<T>, QueueError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match std::mem::replace(&mut this.state, State::Done) {
            State::Ready(outcome) => Poll::Ready(outcome.into_result()),
            State::Waiting(mut rx) => match Pin::new(&mut rx).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome.into_result()),
                // The queue went away without resolving us: nothing more can arrive.
                Poll::Ready(Err(_)) => Poll::Ready(Ok(None)),
                Poll::Pending => {
                    this.state = State::Waiting(rx);
                    Poll::Pending
                }
            },
            State::Done => panic!("Next polled after completion"),
        }
    }
}

/// Wakes a thread parked in [`Next::wait_timeout`].
struct ThreadWaker(Unparker);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}
