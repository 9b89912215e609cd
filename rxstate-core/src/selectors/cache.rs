//! Cache Strategies
//!
//! A cache stores the results of a memoized function keyed by the argument
//! tuple of each call. Three interchangeable strategies share the [`Cache`]
//! trait:
//!
//! - [`SingleValueCache`] keeps only the last entry. A lookup hits when the
//!   injected comparator judges the key equal to the stored one. This is the
//!   usual selector case where only the latest state matters.
//!
//! - [`HashCache`] keeps an unbounded number of entries indexed by a 32-bit
//!   hash of the serialized key (see [`super::hash`]). Colliding keys share a
//!   slot.
//!
//! - [`LruCache`] keeps up to `size` entries ordered most recently used
//!   first. Lookups scan with the comparator and promote the hit.
//!
//! # Lookups
//!
//! `get` returns `None` on a miss. Cached values are never wrapped or
//! inspected, so a function that legitimately returns `None` or `()` is
//! cached like any other and comes back as `Some(&None)` or `Some(&())`.

use std::collections::VecDeque;

use indexmap::IndexMap;
use tracing::debug;

use super::hash::KeySerializer;
use super::types::{ArgumentTuple, CacheEntry, EqualityFn, TupleComparator};

/// Storage for memoized results.
pub trait Cache<E, V> {
    /// Look up the value stored for `key`.
    fn get(&mut self, key: &[E]) -> Option<&V>;

    /// Store `value` for `key`, following the strategy's replacement policy.
    fn set(&mut self, key: ArgumentTuple<E>, value: V);

    /// The stored values, in strategy order.
    fn entries(&self) -> Vec<&V>;

    /// Drop every entry.
    fn clear(&mut self);

    /// Number of stored entries.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if the cache holds no entry.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a tuple comparator from an element predicate.
///
/// Tuples of different lengths are never equal. Otherwise every position
/// must satisfy `equals`.
pub fn tuple_comparator<E: 'static>(equals: EqualityFn<E>) -> TupleComparator<E> {
    std::rc::Rc::new(move |prev: &[E], next: &[E]| {
        prev.len() == next.len() && prev.iter().zip(next).all(|(a, b)| equals(a, b))
    })
}

// ----------------------------------------------------------------------------
// Single value
// ----------------------------------------------------------------------------

/// A cache holding at most one entry.
pub struct SingleValueCache<E, V> {
    equals: TupleComparator<E>,
    entry: Option<CacheEntry<E, V>>,
}

impl<E, V> SingleValueCache<E, V> {
    pub fn new(equals: TupleComparator<E>) -> Self {
        Self { equals, entry: None }
    }
}

impl<E, V> Cache<E, V> for SingleValueCache<E, V> {
    fn get(&mut self, key: &[E]) -> Option<&V> {
        match &self.entry {
            Some(entry) if (self.equals)(entry.key.as_slice(), key) => Some(&entry.value),
            _ => None,
        }
    }

    fn set(&mut self, key: ArgumentTuple<E>, value: V) {
        self.entry = Some(CacheEntry::new(key, value));
    }

    fn entries(&self) -> Vec<&V> {
        self.entry.iter().map(|entry| &entry.value).collect()
    }

    fn clear(&mut self) {
        self.entry = None;
    }

    fn len(&self) -> usize {
        usize::from(self.entry.is_some())
    }
}

// ----------------------------------------------------------------------------
// Hash
// ----------------------------------------------------------------------------

/// An unbounded cache indexed by key hash.
///
/// Entries keep their first insertion order, which is the order
/// [`Cache::entries`] reports.
pub struct HashCache<E, V> {
    serializer: KeySerializer<E>,
    store: IndexMap<i32, V>,
}

impl<E, V> HashCache<E, V> {
    pub fn new(serializer: KeySerializer<E>) -> Self {
        Self {
            serializer,
            store: IndexMap::new(),
        }
    }
}

impl<E, V> Cache<E, V> for HashCache<E, V> {
    fn get(&mut self, key: &[E]) -> Option<&V> {
        self.store.get(&self.serializer.hash_key(key))
    }

    fn set(&mut self, key: ArgumentTuple<E>, value: V) {
        // A colliding key silently replaces the value in place.
        self.store.insert(self.serializer.hash_key(&key), value);
    }

    fn entries(&self) -> Vec<&V> {
        self.store.values().collect()
    }

    fn clear(&mut self) {
        self.store.clear();
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

// ----------------------------------------------------------------------------
// LRU
// ----------------------------------------------------------------------------

/// A bounded cache evicting the least recently used entry.
///
/// Setting a key that is already present does nothing: neither the stored
/// value nor the recency order changes. Only `get` promotes entries.
pub struct LruCache<E, V> {
    size: usize,
    equals: TupleComparator<E>,
    /// Most recently used first.
    entries: VecDeque<CacheEntry<E, V>>,
}

impl<E, V> LruCache<E, V> {
    /// Create a cache holding up to `size` entries.
    ///
    /// A `size` of zero is treated as one.
    pub fn new(size: usize, equals: TupleComparator<E>) -> Self {
        let size = size.max(1);
        Self {
            size,
            equals,
            entries: VecDeque::with_capacity(size),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.size
    }

    fn position(&self, key: &[E]) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| (self.equals)(key, entry.key.as_slice()))
    }
}

impl<E, V> Cache<E, V> for LruCache<E, V> {
    fn get(&mut self, key: &[E]) -> Option<&V> {
        let index = self.position(key)?;
        if index > 0 {
            if let Some(entry) = self.entries.remove(index) {
                self.entries.push_front(entry);
            }
        }
        self.entries.front().map(|entry| &entry.value)
    }

    fn set(&mut self, key: ArgumentTuple<E>, value: V) {
        if self.position(&key).is_some() {
            return;
        }
        if self.entries.len() >= self.size {
            self.entries.pop_back();
            debug!(capacity = self.size, "evicted least recently used entry");
        }
        self.entries.push_front(CacheEntry::new(key, value));
    }

    fn entries(&self) -> Vec<&V> {
        self.entries.iter().map(|entry| &entry.value).collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
