//! FIFO holding pen for deferred work.
//!
//! [`WaitList`] keeps entries in insertion order with O(1) push at the tail
//! and O(1) removal from the head. Predicate lookups and removals walk the
//! list from the head and are O(n).

use std::collections::VecDeque;

/// An ordered, unbounded FIFO container backed by a ring buffer.
///
/// No uniqueness is enforced: the same value may be pushed any number of
/// times. An empty list has no head and no tail; a single-entry list has
/// `front()` and `back()` pointing at the same entry.
#[derive(Debug, Clone)]
pub struct WaitList<T> {
    entries: VecDeque<T>,
}

impl<T> WaitList<T> {
    /// Create an empty wait list.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append a value at the tail.
    pub fn push(&mut self, value: T) {
        self.entries.push_back(value);
    }

    /// Remove and return the head, or `None` if the list is empty.
    pub fn shift(&mut self) -> Option<T> {
        self.entries.pop_front()
    }

    /// Whether any entry satisfies `predicate`, scanning from the head.
    pub fn exists<P>(&self, predicate: P) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        self.entries.iter().any(predicate)
    }

    /// Remove the first entry (closest to the head) matching `predicate`.
    ///
    /// Later matches are left in place. Returns the removed value, or `None`
    /// when nothing matched.
    pub fn delete<P>(&mut self, predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        let index = self.entries.iter().position(predicate)?;
        self.entries.remove(index)
    }

    /// Number of entries currently held.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Discarded values are dropped without any callback.
    pub fn clear(&mut self) {
        self.entries = VecDeque::new();
    }

    /// Peek at the head.
    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Peek at the tail.
    pub fn back(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T> Default for WaitList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for WaitList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<T> FromIterator<T> for WaitList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
