//! Shared selector types.

use std::rc::Rc;

use smallvec::SmallVec;

/// The positional arguments of one invocation, used as a cache key.
///
/// Most memoized calls take one or two arguments, so those are stored inline.
pub type ArgumentTuple<E> = SmallVec<[E; 2]>;

/// A two-argument equality predicate over single argument values.
pub type EqualityFn<E> = Rc<dyn Fn(&E, &E) -> bool>;

/// Compares two argument tuples.
pub type TupleComparator<E> = Rc<dyn Fn(&[E], &[E]) -> bool>;

/// A stored key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<E, V> {
    pub key: ArgumentTuple<E>,
    pub value: V,
}

impl<E, V> CacheEntry<E, V> {
    pub fn new(key: ArgumentTuple<E>, value: V) -> Self {
        Self { key, value }
    }
}

/// How a memoized function receives its arguments.
///
/// The convention is fixed when the memoized function is built and decides
/// which part of a call forms the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Exactly one argument, keyed as a one-element tuple.
    Single,

    /// Any number of arguments, keyed on the whole tuple.
    Variadic,
}

/// A call convention carried in the type of a memoized function.
pub trait Convention {
    const KIND: CallConvention;
}

/// Marker for memoized functions taking exactly one argument.
#[derive(Debug)]
pub enum SingleArg {}

/// Marker for memoized functions taking a slice of arguments.
#[derive(Debug)]
pub enum VariadicArgs {}

impl Convention for SingleArg {
    const KIND: CallConvention = CallConvention::Single;
}

impl Convention for VariadicArgs {
    const KIND: CallConvention = CallConvention::Variadic;
}

/// Value equality through `PartialEq`.
///
/// This is the default predicate for selectors: two states are the same when
/// they compare equal, field by field.
pub fn strict_equality<T: PartialEq + ?Sized>(a: &T, b: &T) -> bool {
    a == b
}

/// Identity equality for shared values.
///
/// Two `Rc`s are equal only when they point at the same allocation, which
/// makes the check O(1) regardless of the size of the state.
pub fn ptr_equality<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::ptr_eq(a, b)
}
