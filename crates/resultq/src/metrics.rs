/// Counters describing what a queue has done so far.
///
/// Updated under the queue lock, so a snapshot from
/// [`ResultQueue::stats`](crate::ResultQueue::stats) is always consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueStats {
    /// Items accepted by `push()` (fast path and buffered).
    pub pushed: u64,
    /// Items handed straight to a waiting consumer.
    pub fast_path: u64,
    /// Items handed to the consumer (fast path plus buffered).
    pub delivered: u64,
    /// Items pushed after the queue had terminated.
    pub dropped_after_terminal: u64,
    /// Buffered items thrown away by `close()`.
    pub discarded_on_close: u64,
    /// Number of times the buffer grew.
    pub grow_events: u64,
    /// Waiters whose handle was dropped before they were resolved.
    pub abandoned_waiters: u64,
    /// Largest number of items buffered at once.
    pub peak_buffered: usize,
}

impl QueueStats {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items accepted but not yet delivered or discarded.
    pub fn in_flight(&self) -> u64 {
        self.pushed
            .saturating_sub(self.delivered)
            .saturating_sub(self.discarded_on_close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let stats = QueueStats::new();
        assert_eq!(stats, QueueStats::default());
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn test_in_flight_excludes_delivered_and_discarded() {
        let stats = QueueStats {
            pushed: 10,
            delivered: 6,
            discarded_on_close: 3,
            ..QueueStats::new()
        };
        assert_eq!(stats.in_flight(), 1);
    }
}
