//! Async stream over a result queue.

use futures_core::stream::{FusedStream, Stream};
use resultq::{Next, QueueError, ResultQueue};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// `futures::Stream` view of a [`ResultQueue`].
///
/// Yields `Ok(item)` in queue order and ends (`None`) at end-of-stream. An
/// upstream error is yielded once as `Err(QueueError::Upstream(_))`, after
/// which the stream ends; the queue itself keeps reporting the error to
/// anyone calling `next()` on it directly.
///
/// The stream owns the consumer side: dropping it (or calling
/// [`close`](Self::close)) closes the queue and discards anything still
/// buffered.
pub struct ResultStream<T, E> {
    queue: Arc<ResultQueue<T, E>>,
    pending: Option<Next<T, E>>,
    finished: bool,
}

impl<T, E> ResultStream<T, E> {
    /// Wraps a queue. The stream becomes its only consumer.
    pub fn new(queue: Arc<ResultQueue<T, E>>) -> Self {
        Self {
            queue,
            pending: None,
            finished: false,
        }
    }

    /// The underlying queue.
    pub fn queue(&self) -> &Arc<ResultQueue<T, E>> {
        &self.queue
    }

    /// Returns `true` once the stream has yielded its last element.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stops consuming: closes the queue and drops buffered items.
    pub fn close(&mut self) {
        self.pending = None;
        self.finished = true;
        self.queue.close();
    }
}

impl<T, E: Clone> Stream for ResultStream<T, E> {
    type Item = Result<T, QueueError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        // Reuse the outstanding handle, or ask the queue for a new one.
        let mut next = match this.pending.take() {
            Some(next) => next,
            None => match this.queue.next() {
                Ok(next) => next,
                // Somebody else is calling next() on the shared queue.
                Err(err) => return Poll::Ready(Some(Err(err))),
            },
        };

        match Pin::new(&mut next).poll(cx) {
            Poll::Pending => {
                this.pending = Some(next);
                Poll::Pending
            }
            Poll::Ready(Ok(Some(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Ok(None)) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Err(err)) => {
                this.finished = true;
                Poll::Ready(Some(Err(err)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (self.queue.len(), None)
        }
    }
}

impl<T, E: Clone> FusedStream for ResultStream<T, E> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<T, E> Drop for ResultStream<T, E> {
    fn drop(&mut self) {
        self.queue.close();
    }
}
