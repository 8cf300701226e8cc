use crate::error::QueueError;
#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_first_terminal, debug_assert_waiter_implies_empty, debug_assert_waiter_on_empty,
};
use crate::next::{Next, Outcome};
use crate::{GrowRing, QueueConfig, QueueStats};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

// =============================================================================
// HAND-OFF PROTOCOL
// =============================================================================
//
// All state lives in one `State` behind one mutex. The lock is held only for
// bookkeeping; nothing awaits or parks while holding it. Consumers suspend on
// the oneshot receiver inside `Next`, outside the lock.
//
// Producer (`push`):
//   terminal set          -> drop the item
//   waiter outstanding    -> send the item through the waiter (buffer bypassed)
//   otherwise             -> append to the ring, growing it when full
//
// Consumer (`next`), first match wins:
//   live waiter present   -> usage fault
//   ring non-empty        -> oldest item        (drain-before-terminate)
//   Errored(e)            -> e                  (sticky, returned every time)
//   Ended                 -> end-of-stream
//   otherwise             -> register a waiter
//
// Because a waiter is only registered when the ring is empty, and every push
// while it exists goes to it, the ring is always empty while a waiter is
// outstanding. `signal_end`/`signal_error` therefore never race a buffered
// item to the consumer.
//
// A waiter whose `Next` was dropped (timeout, cancelled future) stays in the
// slot. The next `push` notices the closed receiver and buffers the item; the
// next `next()` replaces it.
//
// =============================================================================

/// Terminal state of the producer side.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Terminal<E> {
    Open,
    Ended,
    Errored(E),
}

struct State<T, E> {
    ring: GrowRing<T>,
    waiter: Option<oneshot::Sender<Outcome<T, E>>>,
    terminal: Terminal<E>,
    closed: bool,
    stats: QueueStats,
}

impl<T, E> State<T, E> {
    fn is_open(&self) -> bool {
        matches!(self.terminal, Terminal::Open)
    }

    /// A registered waiter whose `Next` handle is still alive.
    fn has_live_waiter(&self) -> bool {
        self.waiter.as_ref().is_some_and(|waiter| !waiter.is_closed())
    }

    /// Moves an open queue to `terminal`. Returns `false` if it had already terminated.
    fn terminate(&mut self, terminal: Terminal<E>) -> bool {
        if !self.is_open() {
            tracing::trace!("queue already terminated, ignoring terminal signal");
            return false;
        }

        tracing::debug!(
            buffered = self.ring.len(),
            errored = matches!(terminal, Terminal::Errored(_)),
            "result queue terminated"
        );
        let previous = std::mem::replace(&mut self.terminal, terminal);
        debug_assert_first_terminal!(matches!(previous, Terminal::Open));
        true
    }

    /// Resolves the outstanding waiter, if any, with a terminal outcome.
    fn resolve_waiter(&mut self, outcome: Outcome<T, E>) {
        #[cfg(debug_assertions)]
        debug_assert_waiter_implies_empty!(self.waiter.is_some(), self.ring.len());

        if let Some(waiter) = self.waiter.take() {
            if waiter.send(outcome).is_err() {
                self.stats.abandoned_waiters += 1;
            }
        }
    }
}

/// Ordered asynchronous result queue.
///
/// Bridges a push-driven producer (a protocol handler calling
/// [`push`](Self::push), [`signal_end`](Self::signal_end) and
/// [`signal_error`](Self::signal_error) from any thread) to a single
/// pull-driven consumer calling [`next`](Self::next).
///
/// # Ordering
///
/// Items come out in the order they went in. Items buffered before a terminal
/// signal are all delivered before the consumer sees end-of-stream or the
/// error. After an error, every further `next()` returns the same error.
///
/// # Single consumer
///
/// At most one `next()` may be outstanding. A second call before the first
/// handle resolves returns [`QueueError::WaiterOutstanding`].
///
/// # Buffering
///
/// There is no back-pressure: the buffer grows by
/// [`QueueConfig::grow_by`] slots whenever it fills up.
///
/// # Example
///
/// ```
/// use resultq::ResultQueue;
/// use std::time::Duration;
///
/// let queue = ResultQueue::<u32, String>::new();
/// queue.push(1);
/// queue.push(2);
/// queue.signal_end();
///
/// let timeout = Duration::from_millis(100);
/// assert_eq!(queue.next_timeout(timeout), Ok(Some(1)));
/// assert_eq!(queue.next_timeout(timeout), Ok(Some(2)));
/// assert_eq!(queue.next_timeout(timeout), Ok(None));
/// ```
pub struct ResultQueue<T, E> {
    state: Mutex<State<T, E>>,
    config: QueueConfig,
}

impl<T, E> ResultQueue<T, E> {
    /// Creates a queue with the default configuration.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates a queue with a custom configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(State {
                ring: GrowRing::with_config(&config),
                waiter: None,
                terminal: Terminal::Open,
                closed: false,
                stats: QueueStats::new(),
            }),
            config,
        }
    }

    /// The state is consistent between statements, so a panic on another
    /// thread while holding the lock leaves nothing half-done.
    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Producer side
    // -------------------------------------------------------------------------

    /// Hands an item to the consumer.
    ///
    /// Goes straight to a waiting `next()` if there is one, otherwise into
    /// the buffer. Silently dropped once the queue has terminated.
    pub fn push(&self, mut item: T) {
        let mut state = self.lock();

        if !state.is_open() {
            state.stats.dropped_after_terminal += 1;
            tracing::trace!("item pushed after termination dropped");
            return;
        }
        state.stats.pushed += 1;

        if let Some(waiter) = state.waiter.take() {
            #[cfg(debug_assertions)]
            debug_assert_waiter_implies_empty!(true, state.ring.len());

            match waiter.send(Outcome::Item(item)) {
                Ok(()) => {
                    state.stats.fast_path += 1;
                    state.stats.delivered += 1;
                    tracing::trace!("item handed to waiting consumer");
                    return;
                }
                Err(Outcome::Item(returned)) => {
                    state.stats.abandoned_waiters += 1;
                    tracing::debug!("waiter was abandoned, buffering item");
                    item = returned;
                }
                // `send` hands back exactly what it was given.
                Err(_) => return,
            }
        }

        if state.ring.push(item) {
            state.stats.grow_events += 1;
            tracing::debug!(
                capacity = state.ring.capacity(),
                buffered = state.ring.len(),
                "result buffer grew"
            );
        }
        state.stats.peak_buffered = state.stats.peak_buffered.max(state.ring.len());
    }

    /// Marks the end of the stream.
    ///
    /// Buffered items are still delivered first. No-op once terminated.
    pub fn signal_end(&self) {
        let mut state = self.lock();
        if state.terminate(Terminal::Ended) {
            state.resolve_waiter(Outcome::End);
        }
    }

    /// Terminates the stream with an upstream error.
    ///
    /// Buffered items are still delivered first; after that every `next()`
    /// returns this error. No-op once terminated.
    pub fn signal_error(&self, err: E)
    where
        E: Clone,
    {
        let mut state = self.lock();
        if state.terminate(Terminal::Errored(err.clone())) {
            state.resolve_waiter(Outcome::Error(err));
        }
    }

    // -------------------------------------------------------------------------
    // Consumer side
    // -------------------------------------------------------------------------

    /// Requests the next result without blocking.
    ///
    /// The returned handle is already resolved when an item is buffered or
    /// the queue has terminated; otherwise it resolves on the next producer
    /// call. Returns [`QueueError::WaiterOutstanding`] if an earlier handle
    /// is still waiting.
    pub fn next(&self) -> Result<Next<T, E>, QueueError<E>>
    where
        E: Clone,
    {
        let mut state = self.lock();

        if state.has_live_waiter() {
            tracing::error!("next() called while a previous next() is still outstanding");
            return Err(QueueError::WaiterOutstanding);
        }
        if state.waiter.take().is_some() {
            state.stats.abandoned_waiters += 1;
        }

        if let Some(item) = state.ring.pop() {
            state.stats.delivered += 1;
            return Ok(Next::ready(Outcome::Item(item)));
        }

        if let Terminal::Errored(err) = &state.terminal {
            return Ok(Next::ready(Outcome::Error(err.clone())));
        }
        if matches!(state.terminal, Terminal::Ended) {
            return Ok(Next::ready(Outcome::End));
        }

        #[cfg(debug_assertions)]
        debug_assert_waiter_on_empty!(state.ring.len(), state.is_open());

        let (tx, rx) = oneshot::channel();
        state.waiter = Some(tx);
        Ok(Next::waiting(rx))
    }

    /// Blocks the calling thread for the next result, up to `timeout`.
    ///
    /// Returns `Ok(None)` at end-of-stream and [`QueueError::Timeout`] if
    /// nothing arrived in time. A timeout leaves the queue usable: the wait
    /// is abandoned and the next call picks up whatever arrives later.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<T>, QueueError<E>>
    where
        E: Clone,
    {
        self.next()?.wait_timeout(timeout)
    }

    /// Force-terminates the queue.
    ///
    /// Ends the stream if it was still open, resolves a waiting `next()`
    /// with end-of-stream and drops every buffered item. Producer calls made
    /// afterwards are ignored. Calling it again has no further effect.
    pub fn close(&self) {
        let mut state = self.lock();

        if state.is_open() {
            state.terminal = Terminal::Ended;
        }
        state.resolve_waiter(Outcome::End);

        let discarded = state.ring.release();
        state.stats.discarded_on_close += discarded as u64;

        if !state.closed {
            state.closed = true;
            tracing::debug!(discarded, "result queue closed");
        }
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Number of buffered, undelivered items.
    pub fn len(&self) -> usize {
        self.lock().ring.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    /// Slots currently allocated for buffering.
    pub fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    /// Returns `true` while a `next()` handle is registered and unresolved.
    pub fn has_waiter(&self) -> bool {
        self.lock().has_live_waiter()
    }

    /// Returns `true` once the stream has ended, errored or been closed.
    pub fn is_terminated(&self) -> bool {
        !self.lock().is_open()
    }

    /// Returns `true` once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// The configuration the queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Snapshot of the queue's counters.
    pub fn stats(&self) -> QueueStats {
        self.lock().stats
    }
}

impl<T, E> Default for ResultQueue<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for ResultQueue<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let terminal = match state.terminal {
            Terminal::Open => "open",
            Terminal::Ended => "ended",
            Terminal::Errored(_) => "errored",
        };
        f.debug_struct("ResultQueue")
            .field("ring", &state.ring)
            .field("waiting", &state.has_live_waiter())
            .field("terminal", &terminal)
            .field("closed", &state.closed)
            .finish()
    }
}
