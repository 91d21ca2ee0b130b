//! Fixed-capacity stack on a circular array.
//!
//! `RingStack` keeps the most recent `CAPACITY` items pushed into it and hands
//! them back newest first. Pushing into a full stack silently overwrites the
//! oldest item, so a producer never has to check for room.
//!
//! This is not a FIFO queue: the ring only bounds memory.

use core::iter::FusedIterator;

use thiserror::Error;

/// Returned by [`RingStack::pop`] and [`RingStack::peek`] when nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring stack is empty")]
pub struct EmptyError;

/// Overwrite-on-full LIFO buffer with `CAPACITY` slots.
///
/// Mutation requires `&mut self`, so a single owner (the firmware loop)
/// drives it. An interrupt-driven producer would need its own critical
/// section around [`push`](Self::push).
///
/// # Example
///
/// ```
/// use scoreboard_core::RingStack;
///
/// let mut events = RingStack::<u8, 3>::new();
/// for e in 1..=4 {
///     events.push(e);
/// }
/// assert_eq!(events.pop(), Ok(4));
/// assert_eq!(events.pop(), Ok(3));
/// assert_eq!(events.pop(), Ok(2));
/// assert!(events.pop().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RingStack<T, const CAPACITY: usize> {
    slots: [T; CAPACITY],
    /// Slot of the most recently pushed item.
    write_index: usize,
    /// Number of slots holding live items.
    occupied: usize,
}

impl<T: Default, const CAPACITY: usize> RingStack<T, CAPACITY> {
    const NON_ZERO_CAPACITY: () = assert!(CAPACITY > 0, "RingStack capacity must be non-zero");

    /// Create an empty stack with default-initialized slots.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_ZERO_CAPACITY;

        Self {
            slots: core::array::from_fn(|_| T::default()),
            write_index: 0,
            occupied: 0,
        }
    }

    /// Push an item, evicting the oldest one when full.
    pub fn push(&mut self, item: T) {
        // Advance before writing so the index never leaves the array.
        self.write_index = (self.write_index + 1) % CAPACITY;
        self.slots[self.write_index] = item;
        self.occupied = (self.occupied + 1).min(CAPACITY);
    }

    /// Remove and return the most recently pushed item.
    pub fn pop(&mut self) -> Result<T, EmptyError> {
        if self.occupied == 0 {
            return Err(EmptyError);
        }

        let item = core::mem::take(&mut self.slots[self.write_index]);
        self.write_index = self.write_index.checked_sub(1).unwrap_or(CAPACITY - 1);
        self.occupied -= 1;
        Ok(item)
    }

    /// Drop every item. Slots are reset to their default value.
    pub fn clear(&mut self) {
        while self.pop().is_ok() {}
    }
}

impl<T, const CAPACITY: usize> RingStack<T, CAPACITY> {
    /// Borrow the most recently pushed item.
    pub fn peek(&self) -> Result<&T, EmptyError> {
        if self.occupied == 0 {
            return Err(EmptyError);
        }
        Ok(&self.slots[self.write_index])
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupied == CAPACITY
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Iterate over stored items, newest first, without removing them.
    pub fn iter(&self) -> Iter<'_, T, CAPACITY> {
        Iter {
            stack: self,
            index: 0,
        }
    }
}

impl<T: Default, const CAPACITY: usize> Default for RingStack<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest-first iterator returned by [`RingStack::iter`].
pub struct Iter<'a, T, const CAPACITY: usize> {
    stack: &'a RingStack<T, CAPACITY>,
    index: usize,
}

impl<'a, T, const CAPACITY: usize> Iterator for Iter<'a, T, CAPACITY> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.index >= self.stack.occupied {
            return None;
        }
        let slot = (self.stack.write_index + CAPACITY - self.index) % CAPACITY;
        self.index += 1;
        Some(&self.stack.slots[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.stack.occupied - self.index;
        (remaining, Some(remaining))
    }
}

impl<T, const CAPACITY: usize> ExactSizeIterator for Iter<'_, T, CAPACITY> {}

// Once `index` reaches `occupied` it stays there.
impl<T, const CAPACITY: usize> FusedIterator for Iter<'_, T, CAPACITY> {}

impl<'a, T, const CAPACITY: usize> IntoIterator for &'a RingStack<T, CAPACITY> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, CAPACITY>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
