//! resultq - Ordered Asynchronous Result Queue
//!
//! Turns a push-driven producer into a pull-driven, strictly ordered
//! sequence read by one consumer at a time. Built for streamed downloads
//! (bars, quotes, trade reports) where the protocol layer delivers items,
//! an end marker, or an error from whatever thread handles the message, and
//! application code wants to ask for "the next result".
//!
//! # Key Features
//!
//! - Strict FIFO, including across buffer growth
//! - Fast path: an item pushed while the consumer waits bypasses the buffer
//! - Drain-before-terminate: buffered items always precede end/error
//! - Sticky errors: once failed, every later `next()` reports the failure
//! - Usable from async code (`Next` is a `Future`) and from plain threads
//!   (`next_timeout` parks the caller, no runtime needed)
//!
//! # Example
//!
//! ```
//! use resultq::{QueueError, ResultQueue};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let queue = Arc::new(ResultQueue::<u64, String>::new());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     std::thread::spawn(move || {
//!         for i in 0..3 {
//!             queue.push(i);
//!         }
//!         queue.signal_error("connection reset".to_string());
//!     })
//! };
//!
//! let timeout = Duration::from_secs(1);
//! let mut received = Vec::new();
//! let failure = loop {
//!     match queue.next_timeout(timeout) {
//!         Ok(Some(item)) => received.push(item),
//!         Ok(None) => break None,
//!         Err(err) => break Some(err),
//!     }
//! };
//! producer.join().unwrap();
//!
//! assert_eq!(received, vec![0, 1, 2]);
//! assert_eq!(failure, Some(QueueError::Upstream("connection reset".to_string())));
//! ```

mod config;
mod error;
mod invariants;
mod metrics;
mod next;
mod queue;
mod ring;

pub use config::{QueueConfig, DEFAULT_GROW_SIZE};
pub use error::QueueError;
pub use metrics::QueueStats;
pub use next::{Next, Outcome};
pub use queue::ResultQueue;
pub use ring::GrowRing;
