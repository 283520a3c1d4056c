//! Predicate-driven iterator adaptor used to pick kernel symbols out of a
//! symbol table.

use std::fmt;
use std::iter::FusedIterator;

/// Advances a base iterator until an item satisfies the predicate.
///
/// The adaptor is positioned eagerly: after construction and after every
/// step, [`Conditional::peek`] is either `None` (the end) or an item the
/// predicate accepted. The predicate should be pure; iteration order is the
/// base iterator's order.
pub struct Conditional<I: Iterator, P> {
    base: I,
    predicate: P,
    current: Option<I::Item>,
}

impl<I, P> Conditional<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    pub fn new(base: I, predicate: P) -> Self {
        let mut this = Self {
            base,
            predicate,
            current: None,
        };
        this.seek();
        this
    }

    fn seek(&mut self) {
        self.current = self.base.by_ref().find(|item| (self.predicate)(item));
    }

    /// The item at the current position, if not at the end
    pub fn peek(&self) -> Option<&I::Item> {
        self.current.as_ref()
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }
}

impl<I, P> Iterator for Conditional<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let item = self.current.take()?;
        self.seek();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = usize::from(self.current.is_some());
        let (_, upper) = self.base.size_hint();
        (pending, upper.and_then(|u| u.checked_add(pending)))
    }
}

impl<I, P> FusedIterator for Conditional<I, P>
where
    I: FusedIterator,
    P: FnMut(&I::Item) -> bool,
{
}

impl<I, P> Clone for Conditional<I, P>
where
    I: Iterator + Clone,
    I::Item: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            predicate: self.predicate.clone(),
            current: self.current.clone(),
        }
    }
}

impl<I, P> fmt::Debug for Conditional<I, P>
where
    I: Iterator,
    I::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
