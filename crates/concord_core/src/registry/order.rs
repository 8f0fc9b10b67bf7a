//! # Finalized Order Traversal
//!
//! Lazy, restartable views over the append-only finalized sequence.

use std::iter::FusedIterator;
use std::slice;

use super::slot::SubscriberId;

/// One finalized subscriber: its handle and the value it was added with.
pub(crate) struct Finalized<T> {
    pub(crate) id: SubscriberId,
    pub(crate) value: T,
}

/// Iterator over finalized values in ascending position order.
///
/// Reverse it (`.rev()`, or [`Registry::order_reverse`](super::Registry::order_reverse))
/// to walk the same positions in descending order.
pub struct Order<'a, T> {
    inner: slice::Iter<'a, Finalized<T>>,
}

impl<'a, T> Order<'a, T> {
    pub(crate) fn new(entries: &'a [Finalized<T>]) -> Self {
        Self {
            inner: entries.iter(),
        }
    }
}

impl<'a, T> Iterator for Order<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| &entry.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Order<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| &entry.value)
    }
}

impl<T> ExactSizeIterator for Order<'_, T> {}

impl<T> FusedIterator for Order<'_, T> {}

impl<T> Clone for Order<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
