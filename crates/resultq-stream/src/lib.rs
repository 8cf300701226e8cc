//! Async Stream/Sink Adapters for resultq
//!
//! This crate connects a [`resultq::ResultQueue`] to the two sides of a
//! streamed download:
//!
//! - **Protocol side**: [`DownloadSink`] takes [`DownloadEvent`]s (begin,
//!   item, end, error) from whichever thread handles the message, directly
//!   or as a [`futures_sink::Sink`].
//! - **Application side**: [`ResultStream`] is a [`futures_core::Stream`] of
//!   `Result<T, QueueError<E>>` in arrival order.
//!
//! # Example
//!
//! ```ignore
//! use resultq::QueueConfig;
//! use resultq_stream::{download, DownloadEvent, StreamExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sink, mut reports) = download::<TradeReport, SessionError>(QueueConfig::default());
//!
//!     // Hand the sink to the session; it applies one event per message.
//!     session.on_trade_download(move |event| sink.apply(event));
//!
//!     while let Some(report) = reports.next().await {
//!         match report {
//!             Ok(report) => println!("{report:?}"),
//!             Err(err) => eprintln!("download failed: {err}"),
//!         }
//!     }
//! }
//! ```

mod download;
mod stream;

pub use download::{download, download_with_queue, AvailableRange, DownloadEvent, DownloadSink};
pub use stream::ResultStream;

pub use resultq::{QueueConfig, QueueError};

// Re-export useful stream combinators
pub use tokio_stream::StreamExt;
