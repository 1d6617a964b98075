//! Utilities that are needed or useful for the rest of the crate,
//! but that don't really have anything to do with the rating model itself.

use std::collections::vec_deque::{self, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A newest-first sequence that never holds more than a fixed number of elements.
///
/// Pushing to the front of a full history drops the oldest element from the back.
/// The capacity is not serialized, it belongs to whoever owns the history.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BoundedHistory<T>(VecDeque<T>);

impl<T> From<BoundedHistory<T>> for Vec<T> {
    fn from(history: BoundedHistory<T>) -> Self {
        history.0.into()
    }
}

impl<T> BoundedHistory<T> {
    /// Creates a new, empty `BoundedHistory<T>`.
    #[must_use]
    pub fn new() -> Self {
        BoundedHistory(VecDeque::new())
    }

    /// Creates a history from newest-first `elements`, keeping at most `capacity` of them.
    #[must_use]
    pub fn from_newest_first(elements: Vec<T>, capacity: usize) -> Self {
        let mut history = BoundedHistory(VecDeque::from(elements));
        history.truncate(capacity);

        history
    }

    /// Inserts `value` as the newest element, then drops the oldest ones beyond `capacity`.
    pub fn push_front(&mut self, value: T, capacity: usize) {
        self.0.push_front(value);
        self.truncate(capacity);
    }

    /// Drops the oldest elements until at most `capacity` remain.
    pub fn truncate(&mut self, capacity: usize) {
        self.0.truncate(capacity);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The newest element, if any.
    #[must_use]
    pub fn newest(&self) -> Option<&T> {
        self.0.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates from the newest to the oldest element.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.0.iter()
    }
}

impl<'a, T> IntoIterator for &'a BoundedHistory<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
