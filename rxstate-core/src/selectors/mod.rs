//! Memoized Selectors
//!
//! This module implements argument-keyed memoization and the selector
//! composer built on it.
//!
//! # Concepts
//!
//! ## Caches
//!
//! A [`Cache`] stores results keyed by argument tuples. Three strategies are
//! provided: a single-value cache, an unbounded hash cache and a bounded LRU
//! cache. Each memoized function gets its own cache from a [`CacheFactory`].
//!
//! ## Memoized functions
//!
//! [`Memoized`] wraps a function and answers repeated calls with equivalent
//! arguments from its cache. The strategy is picked with [`MemoizeOptions`],
//! or read from a loose [`MemoizeConfig`].
//!
//! ## Selectors
//!
//! A [`Selector`] derives a value from a state, and optionally extra
//! arguments, through input selectors and a combiner. It memoizes both on
//! its arguments and on the input results.
//!
//! # Implementation Notes
//!
//! Memoized functions keep their cache in a `RefCell` and are meant for a
//! single thread. The cache is never borrowed while the wrapped function
//! runs, so memoized functions may recurse.

mod cache;
mod config;
mod create_selector;
mod factory;
mod hash;
mod memoize;
mod types;

pub use cache::{tuple_comparator, Cache, HashCache, LruCache, SingleValueCache};
pub use config::{EqualityConfig, MemoizeConfig};
pub use create_selector::{
    create_selector, create_selector_creator, create_selector_with, input, input_with_props,
    DefaultMemoizer, Input, Memoizer, Select, Selector, SelectorBuilder, SelectorCreator,
    SelectorOptions,
};
pub use factory::{CacheFactory, EqualityCacheFactory, HashCacheFactory};
pub use hash::{serialize_value, string_hash, KeySerializer};
pub use memoize::{
    memoize, memoize_variadic, memoize_variadic_with, memoize_with, CacheStats, MemoizeOptions,
    Memoized,
};
pub use types::{
    ptr_equality, strict_equality, ArgumentTuple, CacheEntry, CallConvention, Convention,
    EqualityFn, SingleArg, TupleComparator, VariadicArgs,
};
