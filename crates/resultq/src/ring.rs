#[cfg(debug_assertions)]
use crate::invariants::debug_assert_capacity_holds;
use crate::QueueConfig;
use std::fmt;
use std::mem;

/// Growable circular buffer - the storage behind a result queue.
///
/// Items are retrieved in insertion order. Unlike a fixed ring, a push into a
/// full buffer never fails: the storage grows by a fixed increment and the
/// wrapped segment is moved so that logical order is preserved.
///
/// Slots are `Option<T>`; popping takes the value out of its slot, so nothing
/// retains a delivered item.
pub struct GrowRing<T> {
    /// Slot storage. `len` slots starting at `head` (wrapping) are occupied.
    slots: Box<[Option<T>]>,
    /// Index of the oldest item.
    head: usize,
    /// Logical number of items.
    len: usize,
    /// Slots added per growth step (always ≥ 1).
    grow_by: usize,
}

impl<T> GrowRing<T> {
    /// Creates a ring with `initial_capacity` slots that grows by `grow_by`.
    ///
    /// A `grow_by` of zero is treated as one.
    pub fn new(initial_capacity: usize, grow_by: usize) -> Self {
        Self {
            slots: empty_slots(initial_capacity),
            head: 0,
            len: 0,
            grow_by: grow_by.max(1),
        }
    }

    /// Creates a ring sized by a queue configuration.
    pub fn with_config(config: &QueueConfig) -> Self {
        Self::new(config.initial_capacity, config.effective_grow_by())
    }

    /// Appends an item at the tail.
    ///
    /// Returns `true` if the storage had to grow to make room.
    pub fn push(&mut self, item: T) -> bool {
        let grew = self.len == self.slots.len();
        if grew {
            self.grow();
        }

        let tail = (self.head + self.len) % self.slots.len();
        debug_assert!(self.slots[tail].is_none(), "tail slot {} is occupied", tail);
        self.slots[tail] = Some(item);
        self.len += 1;

        #[cfg(debug_assertions)]
        debug_assert_capacity_holds!(self.len, self.slots.len());

        grew
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let item = self.slots[self.head].take();
        debug_assert!(item.is_some(), "occupied slot {} was empty", self.head);
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        item
    }

    /// Number of buffered items.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drops every buffered item, keeping the storage.
    ///
    /// Returns how many items were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len;
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
        dropped
    }

    /// Drops every buffered item and frees the storage.
    ///
    /// Returns how many items were dropped. The ring stays usable and will
    /// allocate again on the next push.
    pub fn release(&mut self) -> usize {
        let dropped = self.len;
        self.slots = Box::default();
        self.head = 0;
        self.len = 0;
        dropped
    }

    /// Extends the storage by `grow_by` slots.
    ///
    /// Only called when the ring is full, so every slot is occupied and the
    /// logical sequence is `slots[head..] ++ slots[..head]`. Rotating it to
    /// the front lines the items up at `0..len` in the larger slice.
    fn grow(&mut self) {
        let capacity = self.slots.len() + self.grow_by;

        let mut slots = mem::take(&mut self.slots).into_vec();
        slots.rotate_left(self.head);
        slots.resize_with(capacity, || None);

        self.slots = slots.into_boxed_slice();
        self.head = 0;

        #[cfg(debug_assertions)]
        debug_assert_capacity_holds!(self.len, self.slots.len());
    }
}

impl<T> fmt::Debug for GrowRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowRing")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("head", &self.head)
            .field("grow_by", &self.grow_by)
            .finish()
    }
}

fn empty_slots<T>(capacity: usize) -> Box<[Option<T>]> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots.into_boxed_slice()
}
