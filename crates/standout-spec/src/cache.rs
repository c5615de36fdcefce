//! Compiled-evaluator cache.
//!
//! Maps the identity of an expression tree to its compiled [`Evaluator`].
//! Identity is the item type plus the address of the predicate's shared body,
//! never its description: two separately built trees with the same logic get
//! separate entries, while clones of one specification share an entry.
//!
//! Each entry keeps its tree alive, so an address cannot be reused by a new
//! tree while the entry exists. Entries are never evicted or replaced.
//!
//! Lookups take a shared read lock. Compilation runs outside the lock; when
//! two threads race on the same key, the first insert wins and both callers
//! get the winner's evaluator.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::compile::{compile, Evaluator};
use crate::expr::{Expr, Predicate};

static GLOBAL: Lazy<EvaluatorCache> = Lazy::new(EvaluatorCache::new);

/// The process-wide cache used by
/// [`Specification::evaluate`](crate::Specification::evaluate).
pub fn global() -> &'static EvaluatorCache {
    &GLOBAL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    item: TypeId,
    tree: usize,
}

impl CacheKey {
    fn of<T: 'static>(tree: &Arc<Expr<T>>) -> Self {
        CacheKey {
            item: TypeId::of::<T>(),
            tree: Arc::as_ptr(tree) as *const () as usize,
        }
    }
}

struct CacheEntry {
    // Keeps the keyed address owned by this entry.
    _tree: Arc<dyn Any + Send + Sync>,
    evaluator: Box<dyn Any + Send + Sync>,
}

/// Counters reported by [`EvaluatorCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Append-only map from expression trees to compiled evaluators.
///
/// Use [`global()`] for the shared process-wide table, or create a private
/// cache and pass it to
/// [`Specification::evaluate_in`](crate::Specification::evaluate_in).
#[derive(Default)]
pub struct EvaluatorCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EvaluatorCache {
    pub fn new() -> Self {
        EvaluatorCache::default()
    }

    /// Returns the cached evaluator for `predicate`, compiling it on first
    /// use.
    pub fn get_or_compile<T: 'static>(&self, predicate: &Predicate<T>) -> Evaluator<T> {
        let tree = predicate.shared_body();
        let key = CacheKey::of(tree);

        if let Some(found) = self.lookup::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(item = std::any::type_name::<T>(), "evaluator cache hit");
            return found;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let compiled = compile(tree);

        let mut entries = self.entries.write();
        let raced = entries.contains_key(&key);
        let entry = entries.entry(key).or_insert_with(|| CacheEntry {
            _tree: Arc::clone(tree) as Arc<dyn Any + Send + Sync>,
            evaluator: Box::new(Arc::clone(&compiled)),
        });
        if raced {
            debug!(
                item = std::any::type_name::<T>(),
                "evaluator compiled concurrently, keeping first insert"
            );
        } else {
            debug!(
                item = std::any::type_name::<T>(),
                nodes = tree.node_count(),
                "compiled evaluator"
            );
        }

        entry
            .evaluator
            .downcast_ref::<Evaluator<T>>()
            .cloned()
            .unwrap_or(compiled)
    }

    fn lookup<T: 'static>(&self, key: &CacheKey) -> Option<Evaluator<T>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .and_then(|entry| entry.evaluator.downcast_ref::<Evaluator<T>>())
            .cloned()
    }

    /// Returns `true` if `predicate` has already been compiled here.
    pub fn contains<T: 'static>(&self, predicate: &Predicate<T>) -> bool {
        self.entries
            .read()
            .contains_key(&CacheKey::of(predicate.shared_body()))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EvaluatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorCache")
            .field("stats", &self.stats())
            .finish()
    }
}
