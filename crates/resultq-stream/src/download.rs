//! Producer side of a streamed download.

use crate::stream::ResultStream;
use chrono::{DateTime, Utc};
use futures_sink::Sink;
use resultq::{Outcome, QueueConfig, ResultQueue};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

/// Creates a download: a producer handle and the stream that consumes it.
///
/// # Example
///
/// ```
/// use resultq::QueueConfig;
/// use resultq_stream::{download, DownloadEvent, StreamExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sink, mut stream) = download::<u32, String>(QueueConfig::default());
///
/// // Protocol handler
/// sink.apply(DownloadEvent::Begin {
///     download_id: "bars-1".into(),
///     available: None,
/// });
/// sink.apply(DownloadEvent::Item(1));
/// sink.apply(DownloadEvent::End);
///
/// // Application
/// assert_eq!(stream.next().await, Some(Ok(1)));
/// assert_eq!(stream.next().await, None);
/// # }
/// ```
pub fn download<T, E>(config: QueueConfig) -> (DownloadSink<T, E>, ResultStream<T, E>) {
    download_with_queue(Arc::new(ResultQueue::with_config(config)))
}

/// Creates a download around an existing queue.
pub fn download_with_queue<T, E>(
    queue: Arc<ResultQueue<T, E>>,
) -> (DownloadSink<T, E>, ResultStream<T, E>) {
    let sink = DownloadSink::new(Arc::clone(&queue));
    (sink, ResultStream::new(queue))
}

/// One protocol message belonging to a streamed download.
///
/// The session maps its download-begin, item, end and error messages onto
/// these variants instead of wiring one callback per message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent<T, E> {
    /// The server accepted the request and assigned it an id, optionally
    /// reporting the time span it actually holds data for.
    Begin {
        download_id: String,
        available: Option<AvailableRange>,
    },
    /// One result row (bar, quote, trade report, ...).
    Item(T),
    /// The server finished sending.
    End,
    /// The server or transport failed the download.
    Error(E),
}

/// Time span the server reports having data for, which may be narrower than
/// the span that was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailableRange {
    /// First instant with data.
    pub from: DateTime<Utc>,
    /// Last instant with data.
    pub to: DateTime<Utc>,
}

impl AvailableRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Returns `true` if `at` falls within the range, both ends included.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// What the server said when it accepted the download.
#[derive(Debug)]
struct BeginInfo {
    download_id: String,
    available: Option<AvailableRange>,
}

impl<T, E> From<Outcome<T, E>> for DownloadEvent<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Item(item) => Self::Item(item),
            Outcome::End => Self::End,
            Outcome::Error(err) => Self::Error(err),
        }
    }
}

/// Producer handle feeding a download's queue.
///
/// Cloneable, so every protocol thread that may see messages for this
/// download can hold one. Nothing it does ever fails: once the download has
/// terminated, further events are dropped.
pub struct DownloadSink<T, E> {
    queue: Arc<ResultQueue<T, E>>,
    begin: Arc<OnceLock<BeginInfo>>,
}

impl<T, E> Clone for DownloadSink<T, E> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            begin: Arc::clone(&self.begin),
        }
    }
}

impl<T, E> DownloadSink<T, E> {
    /// Wraps a queue as a download producer.
    pub fn new(queue: Arc<ResultQueue<T, E>>) -> Self {
        Self {
            queue,
            begin: Arc::new(OnceLock::new()),
        }
    }

    /// The id assigned by the server, once `Begin` has been applied.
    pub fn download_id(&self) -> Option<&str> {
        self.begin.get().map(|info| info.download_id.as_str())
    }

    /// The data range the server reported in `Begin`, if any.
    pub fn available(&self) -> Option<AvailableRange> {
        self.begin.get().and_then(|info| info.available)
    }

    /// The underlying queue.
    pub fn queue(&self) -> &Arc<ResultQueue<T, E>> {
        &self.queue
    }

    /// Records the server-assigned download id and available range.
    ///
    /// Only the first `begin` is kept; the id and range are stored together.
    pub fn begin(&self, download_id: String, available: Option<AvailableRange>) {
        let info = BeginInfo {
            download_id,
            available,
        };
        match self.begin.set(info) {
            Ok(()) => tracing::debug!(
                download_id = self.download_id(),
                available = ?self.available(),
                "download started"
            ),
            Err(rejected) => tracing::warn!(
                download_id = self.download_id(),
                rejected = %rejected.download_id,
                "download already has an id, ignoring second begin"
            ),
        }
    }

    /// Delivers one result.
    pub fn push(&self, item: T) {
        self.queue.push(item);
    }

    /// Marks the download as complete.
    pub fn end(&self) {
        tracing::debug!(download_id = self.download_id(), "download ended");
        self.queue.signal_end();
    }

    /// Cancels the download from the producer side.
    ///
    /// Closes the queue: buffered results are discarded and the consumer
    /// sees end-of-stream.
    pub fn cancel(&self) {
        tracing::debug!(download_id = self.download_id(), "download cancelled");
        self.queue.close();
    }

    /// Returns `true` once the download ended, failed or was cancelled.
    pub fn is_terminated(&self) -> bool {
        self.queue.is_terminated()
    }
}

impl<T, E: Clone> DownloadSink<T, E> {
    /// Fails the download.
    pub fn error(&self, err: E) {
        tracing::debug!(download_id = self.download_id(), "download failed");
        self.queue.signal_error(err);
    }

    /// Applies one protocol event.
    pub fn apply(&self, event: DownloadEvent<T, E>) {
        match event {
            DownloadEvent::Begin {
                download_id,
                available,
            } => self.begin(download_id, available),
            DownloadEvent::Item(item) => self.push(item),
            DownloadEvent::End => self.end(),
            DownloadEvent::Error(err) => self.error(err),
        }
    }
}

impl<T, E: Clone> Sink<DownloadEvent<T, E>> for DownloadSink<T, E> {
    type Error = Infallible;

    /// Always ready: the queue buffers without limit.
    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    /// Applies the event immediately; nothing is held back for `poll_flush`.
    fn start_send(self: Pin<&mut Self>, event: DownloadEvent<T, E>) -> Result<(), Self::Error> {
        self.apply(event);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    /// Ends the download if it has not terminated yet.
    ///
    /// Closing the sink means no more events are coming, which is what `End`
    /// says. Buffered results stay available to the consumer.
    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.queue.signal_end();
        Poll::Ready(Ok(()))
    }
}
