//! Query providers: attaching predicates to lazily evaluated collections.
//!
//! A [`Queryable`] accepts a [`Predicate`] and returns a filtered query. No
//! item is tested when the filter is attached. [`InMemory`] tests items as
//! the caller iterates; [`SqlQuery`](crate::SqlQuery) translates the tree for
//! an external database instead of running it.

use std::slice;

use tracing::trace;

use crate::cache;
use crate::compile::Evaluator;
use crate::expr::Predicate;

/// A lazily evaluated collection that predicates can be pushed into.
pub trait Queryable<T> {
    /// What attaching a filter produces. Providers that can reject a
    /// predicate use a `Result`.
    type Filtered;

    fn filter(self, predicate: &Predicate<T>) -> Self::Filtered;
}

/// A lazy view over a slice.
///
/// # Example
///
/// ```
/// use standout_spec::{InMemory, Specification};
///
/// let even = Specification::from_fn("Even", |n: &i32| n % 2 == 0);
/// let numbers = [1, 2, 3, 4];
///
/// let query = even.apply(InMemory::new(&numbers));
/// assert_eq!(query.to_vec(), vec![&2, &4]);
/// ```
pub struct InMemory<'a, T> {
    items: &'a [T],
    filters: Vec<Predicate<T>>,
}

impl<'a, T: 'static> InMemory<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        InMemory {
            items,
            filters: Vec::new(),
        }
    }

    /// Predicates attached so far, in order.
    pub fn filters(&self) -> &[Predicate<T>] {
        &self.filters
    }

    /// Iterates matching items. Evaluators are fetched from the global
    /// cache here; items are tested as the iterator advances.
    pub fn iter(&self) -> Matches<'a, T> {
        let evaluators = self
            .filters
            .iter()
            .map(|predicate| cache::global().get_or_compile(predicate))
            .collect();
        Matches {
            items: self.items.iter(),
            evaluators,
        }
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn first(&self) -> Option<&'a T> {
        self.iter().next()
    }

    pub fn to_vec(&self) -> Vec<&'a T> {
        self.iter().collect()
    }
}

impl<'a, T: 'static> Queryable<T> for InMemory<'a, T> {
    type Filtered = InMemory<'a, T>;

    fn filter(mut self, predicate: &Predicate<T>) -> Self::Filtered {
        trace!(filter = %predicate, "attached in-memory filter");
        self.filters.push(predicate.clone());
        self
    }
}

impl<'q, 'a, T: 'static> IntoIterator for &'q InMemory<'a, T> {
    type Item = &'a T;
    type IntoIter = Matches<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the items of an [`InMemory`] query that pass every filter.
pub struct Matches<'a, T> {
    items: slice::Iter<'a, T>,
    evaluators: Vec<Evaluator<T>>,
}

impl<'a, T> Iterator for Matches<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let evaluators = &self.evaluators;
        self.items
            .find(|item| evaluators.iter().all(|evaluator| evaluator(*item)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.items.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::Specification;

    #[test]
    fn filters_stack_as_conjunction() {
        let even = Specification::from_fn("Even", |n: &u8| n % 2 == 0);
        let big = Specification::from_fn("Big", |n: &u8| *n > 3);
        let numbers: Vec<u8> = (0..10).collect();

        let query = big.apply(even.apply(InMemory::new(&numbers)));
        assert_eq!(query.filters().len(), 2);
        assert_eq!(query.to_vec(), vec![&4, &6, &8]);
        assert_eq!(query.count(), 3);
        assert_eq!(query.first(), Some(&4));
    }

    #[test]
    fn unfiltered_view_yields_everything() {
        let words = ["a", "b"];
        let query = InMemory::new(&words);
        assert_eq!((&query).into_iter().count(), 2);
    }

    #[test]
    fn nothing_runs_until_iterated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let spec = Specification::from_fn("Counted", move |_: &u8| {
            counted.fetch_add(1, Ordering::SeqCst);
            true
        });

        let numbers = [1u8, 2, 3];
        let query = spec.apply(InMemory::new(&numbers));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut matches = query.iter();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        matches.next();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(matches.count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
