//! Buffer sizing for a result queue.

/// Number of slots added each time the buffer runs out of room.
pub const DEFAULT_GROW_SIZE: usize = 1000;

/// Configuration for [`ResultQueue`](crate::ResultQueue) buffering.
///
/// The queue never applies back-pressure, so these values only decide how
/// storage is allocated, never whether an item is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
    /// Slots allocated up front.
    ///
    /// Default: 1000
    pub initial_capacity: usize,

    /// Slots added whenever a push finds the buffer full. Zero is treated as one.
    ///
    /// Default: 1000
    pub grow_by: usize,
}

impl QueueConfig {
    /// Creates a configuration with explicit sizes.
    pub const fn new(initial_capacity: usize, grow_by: usize) -> Self {
        Self {
            initial_capacity,
            grow_by,
        }
    }

    /// Small footprint for short request/response style downloads.
    pub const fn small() -> Self {
        Self::new(16, 64)
    }

    /// Sets the initial capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the growth increment.
    pub fn with_grow_by(mut self, grow_by: usize) -> Self {
        self.grow_by = grow_by;
        self
    }

    /// Growth increment actually used by the buffer.
    #[inline]
    pub const fn effective_grow_by(&self) -> usize {
        if self.grow_by == 0 {
            1
        } else {
            self.grow_by
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GROW_SIZE, DEFAULT_GROW_SIZE)
    }
}
