//! Debug assertion macros for result queue invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so release
//! builds pay nothing for them.

// =============================================================================
// Buffer: capacity always covers the logical count
// =============================================================================

/// Assert that the ring never holds more items than it has slots.
///
/// **Invariant**: `len ≤ capacity`
///
/// Used in: `GrowRing::push()` after storing, `GrowRing::grow()` after copying
macro_rules! debug_assert_capacity_holds {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "ring holds {} items but only has {} slots",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// Waiter: only registered on an empty, open queue
// =============================================================================

/// Assert that a waiter is registered only when nothing could satisfy it.
///
/// **Invariant**: `register_waiter → buffer.is_empty() ∧ terminal == Open`
///
/// Used in: `ResultQueue::next()` before storing the waiter
macro_rules! debug_assert_waiter_on_empty {
    ($buffered:expr, $open:expr) => {
        debug_assert!(
            $buffered == 0 && $open,
            "waiter registered with {} buffered items (open: {})",
            $buffered,
            $open
        )
    };
}

/// Assert that an outstanding waiter implies an empty buffer.
///
/// **Invariant**: `waiter.is_some() → buffer.is_empty()`
///
/// Used in: `push()`, `signal_end()`, `signal_error()`, `close()` before resolving
macro_rules! debug_assert_waiter_implies_empty {
    ($has_waiter:expr, $buffered:expr) => {
        debug_assert!(
            !$has_waiter || $buffered == 0,
            "waiter outstanding while {} items are buffered",
            $buffered
        )
    };
}

// =============================================================================
// Terminal state: set once
// =============================================================================

/// Assert that a terminal transition starts from the open state.
///
/// **Invariant**: `Open → Ended | Errored`, never `Ended ↔ Errored`
///
/// Used in: `State::terminate()`
macro_rules! debug_assert_first_terminal {
    ($was_open:expr) => {
        debug_assert!(
            $was_open,
            "terminal state is final but a second transition was attempted"
        )
    };
}

pub(crate) use debug_assert_capacity_holds;
pub(crate) use debug_assert_first_terminal;
pub(crate) use debug_assert_waiter_implies_empty;
pub(crate) use debug_assert_waiter_on_empty;
