//! Cache factories.
//!
//! A factory builds a fresh cache for every memoized function, so that no
//! two functions ever share storage.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use super::cache::{tuple_comparator, Cache, HashCache, LruCache, SingleValueCache};
use super::hash::KeySerializer;
use super::types::EqualityFn;

/// Builds caches.
pub trait CacheFactory<E, V> {
    fn create(&self) -> Box<dyn Cache<E, V>>;
}

impl<E, V, F> CacheFactory<E, V> for F
where
    F: Fn() -> Box<dyn Cache<E, V>>,
{
    fn create(&self) -> Box<dyn Cache<E, V>> {
        self()
    }
}

/// Builds [`HashCache`]s.
pub struct HashCacheFactory<E> {
    serializer: KeySerializer<E>,
}

impl<E> HashCacheFactory<E> {
    /// Hash keys with the default serde-based serializer.
    pub fn new() -> Self
    where
        E: Serialize,
    {
        Self::with_serializer(KeySerializer::json())
    }

    /// Hash keys with a custom serializer.
    pub fn with_serializer(serializer: KeySerializer<E>) -> Self {
        Self { serializer }
    }
}

impl<E: Serialize> Default for HashCacheFactory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for HashCacheFactory<E> {
    fn clone(&self) -> Self {
        Self {
            serializer: self.serializer,
        }
    }
}

impl<E> fmt::Debug for HashCacheFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashCacheFactory").finish()
    }
}

impl<E: 'static, V: 'static> CacheFactory<E, V> for HashCacheFactory<E> {
    fn create(&self) -> Box<dyn Cache<E, V>> {
        debug!("creating hash cache");
        Box::new(HashCache::new(self.serializer))
    }
}

/// Builds comparator-based caches.
///
/// With a `size` the factory produces an [`LruCache`] of that capacity,
/// without one (or with a size of zero) a [`SingleValueCache`].
pub struct EqualityCacheFactory<E> {
    equals: EqualityFn<E>,
    size: Option<usize>,
}

impl<E> EqualityCacheFactory<E> {
    pub fn new<F>(equals: F, size: Option<usize>) -> Self
    where
        F: Fn(&E, &E) -> bool + 'static,
    {
        Self {
            equals: Rc::new(equals),
            size,
        }
    }

    /// The LRU capacity, if the factory builds bounded caches.
    pub fn size(&self) -> Option<usize> {
        self.size.filter(|size| *size > 0)
    }
}

impl<E> Clone for EqualityCacheFactory<E> {
    fn clone(&self) -> Self {
        Self {
            equals: Rc::clone(&self.equals),
            size: self.size,
        }
    }
}

impl<E> fmt::Debug for EqualityCacheFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityCacheFactory")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<E: 'static, V: 'static> CacheFactory<E, V> for EqualityCacheFactory<E> {
    fn create(&self) -> Box<dyn Cache<E, V>> {
        let equals = tuple_comparator(Rc::clone(&self.equals));
        match self.size() {
            Some(size) => {
                debug!(size, "creating lru cache");
                Box::new(LruCache::new(size, equals))
            }
            None => {
                debug!("creating single value cache");
                Box::new(SingleValueCache::new(equals))
            }
        }
    }
}
