//! Memoizer
//!
//! A memoized function caches its results keyed by the arguments of each
//! call. Calling it again with equivalent arguments returns the cached result
//! without running the wrapped function.
//!
//! # How Memoization Works
//!
//! 1. The call arguments are collected into an argument tuple.
//!
//! 2. The tuple is looked up in the function's cache.
//!
//! 3. On a hit, the cached value is cloned and returned.
//!
//! 4. On a miss, the wrapped function runs, its result is stored under the
//!    tuple and returned.
//!
//! What "equivalent" means is decided by the cache strategy chosen through
//! [`MemoizeOptions`]: a hash of the serialized arguments (the default), or a
//! comparator with an optional LRU bound, or any custom [`CacheFactory`].
//!
//! # Call Conventions
//!
//! [`memoize`] wraps a one-argument function and keys every call on a
//! one-element tuple. [`memoize_variadic`] wraps a function over a slice of
//! arguments and keys on the whole slice. The convention is part of the type
//! (`Memoized<E, V, SingleArg>` or `Memoized<E, V, VariadicArgs>`), so only
//! variadic functions offer [`Memoized::call_variadic`]. A one-argument
//! function handed a slice goes through [`Memoized::call_first`], which
//! returns `None` for an empty slice.
//!
//! # Failures
//!
//! The cache is not borrowed while the wrapped function runs. A panic in the
//! function unwinds through the memoized call and leaves no entry behind, and
//! recursive memoized functions can call themselves freely.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use tracing::trace;

use super::cache::Cache;
use super::config::MemoizeConfig;
use super::factory::{CacheFactory, EqualityCacheFactory, HashCacheFactory};
use super::hash::KeySerializer;
use super::types::{ArgumentTuple, CallConvention, Convention, SingleArg, VariadicArgs};
use crate::error::ConfigError;

/// The cache strategy of a memoized function.
///
/// Exactly one strategy is selected per memoized function.
pub enum MemoizeOptions<E, V> {
    /// Caches built by a caller-supplied factory.
    CacheFactory(Rc<dyn CacheFactory<E, V>>),

    /// Comparator-based caches, single value or LRU.
    Equality(EqualityCacheFactory<E>),

    /// Caches keyed by the hash of the serialized arguments.
    Hash(HashCacheFactory<E>),
}

impl<E: 'static, V: 'static> MemoizeOptions<E, V> {
    /// Use a custom cache factory.
    pub fn cache_factory<F>(factory: F) -> Self
    where
        F: CacheFactory<E, V> + 'static,
    {
        Self::CacheFactory(Rc::new(factory))
    }

    /// Keep the last result only, compared with `equals`.
    pub fn equality<F>(equals: F) -> Self
    where
        F: Fn(&E, &E) -> bool + 'static,
    {
        Self::Equality(EqualityCacheFactory::new(equals, None))
    }

    /// Keep up to `size` results, compared with `equals`.
    pub fn lru<F>(size: usize, equals: F) -> Self
    where
        F: Fn(&E, &E) -> bool + 'static,
    {
        Self::Equality(EqualityCacheFactory::new(equals, Some(size)))
    }

    /// Hash serialized arguments.
    pub fn hash() -> Self
    where
        E: Serialize,
    {
        Self::Hash(HashCacheFactory::new())
    }

    /// Hash arguments serialized by `serializer`.
    pub fn hash_with(serializer: KeySerializer<E>) -> Self {
        Self::Hash(HashCacheFactory::with_serializer(serializer))
    }

    /// Build a fresh cache for this strategy.
    pub fn create_cache(&self) -> Box<dyn Cache<E, V>> {
        match self {
            Self::CacheFactory(factory) => factory.create(),
            Self::Equality(factory) => factory.create(),
            Self::Hash(factory) => factory.create(),
        }
    }

    /// Name of the selected strategy.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::CacheFactory(_) => "cache_factory",
            Self::Equality(_) => "equality",
            Self::Hash(_) => "hash",
        }
    }
}

impl<E: Serialize + 'static, V: 'static> Default for MemoizeOptions<E, V> {
    fn default() -> Self {
        Self::hash()
    }
}

impl<E, V> Clone for MemoizeOptions<E, V> {
    fn clone(&self) -> Self {
        match self {
            Self::CacheFactory(factory) => Self::CacheFactory(Rc::clone(factory)),
            Self::Equality(factory) => Self::Equality(factory.clone()),
            Self::Hash(factory) => Self::Hash(factory.clone()),
        }
    }
}

impl<E, V> fmt::Debug for MemoizeOptions<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheFactory(_) => f.write_str("CacheFactory(..)"),
            Self::Equality(factory) => f.debug_tuple("Equality").field(factory).finish(),
            Self::Hash(factory) => f.debug_tuple("Hash").field(factory).finish(),
        }
    }
}

/// Hit/miss counters of a memoized function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that ran the wrapped function.
    pub misses: u64,
    /// Current number of cached entries.
    pub size: usize,
}

impl CacheStats {
    /// Hit rate as a percentage (0.0 to 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats(hits={}, misses={}, size={})",
            self.hits, self.misses, self.size
        )
    }
}

enum Invoker<E, V> {
    Single(Box<dyn Fn(&E) -> V>),
    Variadic(Box<dyn Fn(&[E]) -> V>),
}

/// A function wrapped with a result cache.
///
/// `C` is the call convention, [`SingleArg`] or [`VariadicArgs`].
pub struct Memoized<E, V, C = SingleArg> {
    invoker: Invoker<E, V>,
    cache: RefCell<Box<dyn Cache<E, V>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
    convention: PhantomData<fn() -> C>,
}

impl<E, V> Memoized<E, V, SingleArg>
where
    E: Clone + 'static,
    V: Clone + 'static,
{
    /// Memoize a one-argument function.
    pub fn single<F>(f: F, options: MemoizeOptions<E, V>) -> Self
    where
        F: Fn(&E) -> V + 'static,
    {
        Self::build(Invoker::Single(Box::new(f)), &options)
    }

    /// Memoize a one-argument function with a loose configuration.
    ///
    /// Fails when the configuration selects more than one strategy.
    pub fn from_config<F>(f: F, config: MemoizeConfig) -> Result<Self, ConfigError>
    where
        E: PartialEq + Serialize,
        F: Fn(&E) -> V + 'static,
    {
        Ok(Self::single(f, config.into_options()?))
    }

    /// Call with the first of a list of arguments.
    ///
    /// Only the first argument is seen and keyed. Returns `None` when `args`
    /// is empty.
    pub fn call_first(&self, args: &[E]) -> Option<V> {
        args.first().map(|arg| self.call(arg))
    }
}

impl<E, V> Memoized<E, V, VariadicArgs>
where
    E: Clone + 'static,
    V: Clone + 'static,
{
    /// Memoize a function over a slice of arguments.
    pub fn variadic<F>(f: F, options: MemoizeOptions<E, V>) -> Self
    where
        F: Fn(&[E]) -> V + 'static,
    {
        Self::build(Invoker::Variadic(Box::new(f)), &options)
    }

    /// Memoize a function over a slice of arguments with a loose
    /// configuration.
    pub fn variadic_from_config<F>(f: F, config: MemoizeConfig) -> Result<Self, ConfigError>
    where
        E: PartialEq + Serialize,
        F: Fn(&[E]) -> V + 'static,
    {
        Ok(Self::variadic(f, config.into_options()?))
    }

    /// Call with a list of arguments, keyed on the whole list.
    pub fn call_variadic(&self, args: &[E]) -> V {
        self.compute_into_cache(args)
    }
}

impl<E, V, C> Memoized<E, V, C>
where
    E: Clone + 'static,
    V: Clone + 'static,
{
    fn build(invoker: Invoker<E, V>, options: &MemoizeOptions<E, V>) -> Self {
        trace!(strategy = options.strategy(), "memoizing function");
        Self {
            invoker,
            cache: RefCell::new(options.create_cache()),
            hits: Cell::new(0),
            misses: Cell::new(0),
            convention: PhantomData,
        }
    }

    /// Call with a single argument.
    ///
    /// A variadic function receives a one-element slice.
    pub fn call(&self, arg: &E) -> V {
        self.compute_into_cache(std::slice::from_ref(arg))
    }

    fn compute_into_cache(&self, key: &[E]) -> V {
        // The borrow ends with the statement so the function below can
        // re-enter this memoized function.
        let cached = self.cache.borrow_mut().get(key).cloned();
        if let Some(value) = cached {
            self.hits.set(self.hits.get() + 1);
            trace!(arity = key.len(), "memoized call hit");
            return value;
        }

        self.misses.set(self.misses.get() + 1);
        trace!(arity = key.len(), "memoized call miss");

        let value = match &self.invoker {
            // Only `call` reaches a single-argument function, always with a
            // one-element key.
            Invoker::Single(f) => f(&key[0]),
            Invoker::Variadic(f) => f(key),
        };
        let key: ArgumentTuple<E> = key.iter().cloned().collect();
        self.cache.borrow_mut().set(key, value.clone());
        value
    }
}

impl<E, V, C: Convention> Memoized<E, V, C> {
    /// The call convention fixed at construction.
    pub fn convention(&self) -> CallConvention {
        C::KIND
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cached results, in cache order.
    pub fn entries(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.cache.borrow().entries().into_iter().cloned().collect()
    }

    /// Hit/miss counters since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            size: self.len(),
        }
    }
}

impl<E, V, C: Convention> fmt::Debug for Memoized<E, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("convention", &self.convention())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Memoize a one-argument function with the default hash strategy.
pub fn memoize<E, V, F>(f: F) -> Memoized<E, V>
where
    E: Clone + Serialize + 'static,
    V: Clone + 'static,
    F: Fn(&E) -> V + 'static,
{
    Memoized::single(f, MemoizeOptions::hash())
}

/// Memoize a function over a slice of arguments with the default hash
/// strategy.
pub fn memoize_variadic<E, V, F>(f: F) -> Memoized<E, V, VariadicArgs>
where
    E: Clone + Serialize + 'static,
    V: Clone + 'static,
    F: Fn(&[E]) -> V + 'static,
{
    Memoized::variadic(f, MemoizeOptions::hash())
}

/// Memoize a one-argument function with an explicit strategy.
pub fn memoize_with<E, V, F>(f: F, options: MemoizeOptions<E, V>) -> Memoized<E, V>
where
    E: Clone + 'static,
    V: Clone + 'static,
    F: Fn(&E) -> V + 'static,
{
    Memoized::single(f, options)
}

/// Memoize a function over a slice of arguments with an explicit strategy.
pub fn memoize_variadic_with<E, V, F>(
    f: F,
    options: MemoizeOptions<E, V>,
) -> Memoized<E, V, VariadicArgs>
where
    E: Clone + 'static,
    V: Clone + 'static,
    F: Fn(&[E]) -> V + 'static,
{
    Memoized::variadic(f, options)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
