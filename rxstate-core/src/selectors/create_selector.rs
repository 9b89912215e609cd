//! Selector Composition
//!
//! A selector derives a value from a state. Composed selectors are built from
//! any number of input selectors and one combiner:
//!
//! ```rust
//! use rxstate_core::selectors::{create_selector, input};
//!
//! #[derive(Clone, PartialEq)]
//! struct Shop {
//!     tax_percent: f64,
//!     prices: Vec<f64>,
//! }
//!
//! let select_subtotal = create_selector(
//!     vec![input(|shop: &Shop| shop.prices.clone())],
//!     |prices: &[Vec<f64>]| prices[0].iter().sum::<f64>(),
//! );
//!
//! let select_tax = create_selector(
//!     vec![select_subtotal.as_input(), input(|shop: &Shop| shop.tax_percent)],
//!     |values: &[f64]| values[0] * values[1] / 100.0,
//! );
//!
//! let shop = Shop { tax_percent: 10.0, prices: vec![1.0, 1.5] };
//! assert_eq!(select_subtotal.select(&shop), 2.5);
//! assert_eq!(select_tax.select(&shop), 0.25);
//! ```
//!
//! # Two Layers of Memoization
//!
//! Every composed selector owns two memoized functions:
//!
//! 1. The outer one is keyed on the selector arguments: the state, followed
//!    by any extra arguments passed to [`Selector::select_args`]. When they
//!    are equivalent to a cached tuple, neither the inputs nor the combiner
//!    run.
//!
//! 2. The inner one wraps the combiner and is keyed on the tuple of input
//!    results. A new state whose inputs resolve to the same values reuses the
//!    previous combination.
//!
//! Both layers use the same strategy, configured through
//! [`SelectorOptions`]. The default compares with `PartialEq` and keeps the
//! last value only.
//!
//! # Inputs
//!
//! Inputs are closures `Fn(&S) -> R` or other selectors. They all produce the
//! same result type `R`, and the combiner receives them positionally as a
//! `&[R]`. A closure input sees the state only. Inputs built with
//! [`input_with_props`] and nested selectors also see the extra arguments:
//!
//! ```rust
//! use rxstate_core::selectors::{create_selector, input_with_props};
//!
//! let select_scaled = create_selector(
//!     vec![input_with_props(|base: &i64, props: &[i64]| {
//!         base * props.first().copied().unwrap_or(1)
//!     })],
//!     |values: &[i64]| values[0],
//! );
//!
//! assert_eq!(select_scaled.select(&4), 4);
//! assert_eq!(select_scaled.select_args(&[4, 3]), Some(12));
//! ```
//!
//! Anything that is not a selector is rejected by the compiler:
//!
//! ```compile_fail
//! use rxstate_core::selectors::create_selector;
//!
//! let select = create_selector(vec![42], |values: &[i32]| values.len());
//! ```
//!
//! A selector with no input is valid; its combiner receives an empty slice.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use super::config::MemoizeConfig;
use super::memoize::{MemoizeOptions, Memoized};
use super::types::{strict_equality, ArgumentTuple, SingleArg, VariadicArgs};
use crate::error::ConfigError;

/// Anything that derives an `R` from a state `S`.
pub trait Select<S, R> {
    fn select(&self, state: &S) -> R;

    /// Derive from a state and the extra arguments of a selector call.
    ///
    /// The default ignores `props`.
    fn select_with_props(&self, state: &S, props: &[S]) -> R {
        let _ = props;
        self.select(state)
    }
}

impl<S, R, F> Select<S, R> for F
where
    F: Fn(&S) -> R,
{
    fn select(&self, state: &S) -> R {
        self(state)
    }
}

/// A type-erased selector input.
pub type Input<S, R> = Rc<dyn Select<S, R>>;

/// Box a closure as a selector input.
pub fn input<S, R, F>(f: F) -> Input<S, R>
where
    F: Fn(&S) -> R + 'static,
{
    Rc::new(f)
}

/// An input that also reads the extra arguments of a selector call.
struct WithProps<F>(F);

impl<S, R, F> Select<S, R> for WithProps<F>
where
    F: Fn(&S, &[S]) -> R,
{
    fn select(&self, state: &S) -> R {
        (self.0)(state, &[])
    }

    fn select_with_props(&self, state: &S, props: &[S]) -> R {
        (self.0)(state, props)
    }
}

/// Box a closure over the state and the extra arguments as a selector input.
pub fn input_with_props<S, R, F>(f: F) -> Input<S, R>
where
    S: 'static,
    R: 'static,
    F: Fn(&S, &[S]) -> R + 'static,
{
    Rc::new(WithProps(f))
}

// ----------------------------------------------------------------------------
// Options
// ----------------------------------------------------------------------------

/// Memoization strategies of the two selector layers.
pub struct SelectorOptions<S, R, O> {
    /// Strategy of the outer layer, keyed element-wise on the selector
    /// arguments.
    pub input: MemoizeOptions<S, O>,
    /// Strategy of the combiner layer, keyed on the input results.
    pub output: MemoizeOptions<R, O>,
}

impl<S, R, O> SelectorOptions<S, R, O>
where
    S: 'static,
    R: 'static,
    O: 'static,
{
    pub fn new(input: MemoizeOptions<S, O>, output: MemoizeOptions<R, O>) -> Self {
        Self { input, output }
    }

    /// Compare with `PartialEq` and keep the last value.
    pub fn equality() -> Self
    where
        S: PartialEq,
        R: PartialEq,
    {
        Self::new(
            MemoizeOptions::equality(strict_equality::<S>),
            MemoizeOptions::equality(strict_equality::<R>),
        )
    }

    /// Compare with `PartialEq` and keep up to `size` values.
    pub fn lru(size: usize) -> Self
    where
        S: PartialEq,
        R: PartialEq,
    {
        Self::new(
            MemoizeOptions::lru(size, strict_equality::<S>),
            MemoizeOptions::lru(size, strict_equality::<R>),
        )
    }

    /// Hash serialized arguments.
    pub fn hash() -> Self
    where
        S: Serialize,
        R: Serialize,
    {
        Self::new(MemoizeOptions::hash(), MemoizeOptions::hash())
    }

    /// Build both layers from one loose configuration.
    pub fn from_config(config: MemoizeConfig) -> Result<Self, ConfigError>
    where
        S: PartialEq + Serialize,
        R: PartialEq + Serialize,
    {
        Ok(Self::new(config.into_options()?, config.into_options()?))
    }
}

impl<S, R, O> Clone for SelectorOptions<S, R, O> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

impl<S, R, O> fmt::Debug for SelectorOptions<S, R, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorOptions")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Memoizer
// ----------------------------------------------------------------------------

/// The memoization function a selector creator builds its layers with.
pub trait Memoizer {
    fn memoize<E, V, F>(&self, f: F, options: MemoizeOptions<E, V>) -> Memoized<E, V, SingleArg>
    where
        E: Clone + 'static,
        V: Clone + 'static,
        F: Fn(&E) -> V + 'static;

    /// Both selector layers are built through this method.
    fn memoize_variadic<E, V, F>(
        &self,
        f: F,
        options: MemoizeOptions<E, V>,
    ) -> Memoized<E, V, VariadicArgs>
    where
        E: Clone + 'static,
        V: Clone + 'static,
        F: Fn(&[E]) -> V + 'static;
}

/// Builds layers with [`Memoized::single`] and [`Memoized::variadic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMemoizer;

impl Memoizer for DefaultMemoizer {
    fn memoize<E, V, F>(&self, f: F, options: MemoizeOptions<E, V>) -> Memoized<E, V, SingleArg>
    where
        E: Clone + 'static,
        V: Clone + 'static,
        F: Fn(&E) -> V + 'static,
    {
        Memoized::single(f, options)
    }

    fn memoize_variadic<E, V, F>(
        &self,
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
}

// ----------------------------------------------------------------------------
// Selector
// ----------------------------------------------------------------------------

struct SelectorInner<S, O> {
    memoized: Memoized<S, O, VariadicArgs>,
    last_result: Rc<RefCell<Option<O>>>,
    recomputations: Rc<Cell<u64>>,
}

/// A composed, memoized selector.
///
/// Cloning is cheap and clones share their caches.
pub struct Selector<S, O> {
    inner: Rc<SelectorInner<S, O>>,
}

impl<S, O> Selector<S, O>
where
    S: Clone + 'static,
    O: Clone + 'static,
{
    /// Derive the value for `state`.
    pub fn select(&self, state: &S) -> O {
        self.inner.memoized.call(state)
    }

    /// Derive the value for a state followed by extra arguments.
    ///
    /// The outer layer is keyed on the whole argument list. Returns `None`
    /// when `args` is empty, since there is no state to read.
    pub fn select_args(&self, args: &[S]) -> Option<O> {
        if args.is_empty() {
            return None;
        }
        Some(self.inner.memoized.call_variadic(args))
    }

    /// Use this selector as the input of another one.
    pub fn as_input(&self) -> Input<S, O> {
        Rc::new(self.clone())
    }
}

impl<S, O> Selector<S, O> {
    /// The last value computed by the outer layer.
    pub fn last_result(&self) -> Option<O>
    where
        O: Clone,
    {
        self.inner.last_result.borrow().clone()
    }

    /// Number of times the combiner ran.
    pub fn recomputations(&self) -> u64 {
        self.inner.recomputations.get()
    }

    /// Reset the combiner run counter.
    pub fn reset_recomputations(&self) {
        self.inner.recomputations.set(0);
    }

    /// Drop the results cached by the outer layer.
    pub fn clear_cache(&self) {
        self.inner.memoized.clear();
    }
}

impl<S: Clone + 'static, O: Clone + 'static> Select<S, O> for Selector<S, O> {
    fn select(&self, state: &S) -> O {
        Selector::select(self, state)
    }

    fn select_with_props(&self, state: &S, props: &[S]) -> O {
        if props.is_empty() {
            return Selector::select(self, state);
        }
        let mut args = ArgumentTuple::with_capacity(props.len() + 1);
        args.push(state.clone());
        args.extend(props.iter().cloned());
        self.inner.memoized.call_variadic(&args)
    }
}

impl<S, O> Clone for Selector<S, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, O> fmt::Debug for Selector<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("recomputations", &self.recomputations())
            .field("cache", &self.inner.memoized)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Creator
// ----------------------------------------------------------------------------

/// Builds selectors with a fixed memoizer and default options.
pub struct SelectorCreator<S, R, O, M = DefaultMemoizer> {
    memoizer: M,
    defaults: SelectorOptions<S, R, O>,
}

/// Create a selector creator.
///
/// `defaults` apply to every selector built without explicit options.
pub fn create_selector_creator<S, R, O, M>(
    memoizer: M,
    defaults: SelectorOptions<S, R, O>,
) -> SelectorCreator<S, R, O, M>
where
    M: Memoizer,
{
    SelectorCreator { memoizer, defaults }
}

impl<S, R, O> Default for SelectorCreator<S, R, O>
where
    S: PartialEq + 'static,
    R: PartialEq + 'static,
    O: 'static,
{
    fn default() -> Self {
        create_selector_creator(DefaultMemoizer, SelectorOptions::equality())
    }
}

impl<S, R, O, M> SelectorCreator<S, R, O, M>
where
    S: Clone + 'static,
    R: Clone + 'static,
    O: Clone + 'static,
    M: Memoizer,
{
    /// Compose a selector from `inputs` and `combiner`.
    ///
    /// `options` replace the creator's defaults for this selector.
    pub fn create_selector<C>(
        &self,
        inputs: Vec<Input<S, R>>,
        combiner: C,
        options: Option<SelectorOptions<S, R, O>>,
    ) -> Selector<S, O>
    where
        C: Fn(&[R]) -> O + 'static,
    {
        let options = options.unwrap_or_else(|| self.defaults.clone());
        debug!(
            inputs = inputs.len(),
            strategy = options.input.strategy(),
            "creating selector"
        );

        let recomputations = Rc::new(Cell::new(0));
        let counter = Rc::clone(&recomputations);
        let output = self.memoizer.memoize_variadic(
            move |results: &[R]| {
                counter.set(counter.get() + 1);
                combiner(results)
            },
            options.output,
        );

        let last_result = Rc::new(RefCell::new(None));
        let last = Rc::clone(&last_result);
        let memoized = self.memoizer.memoize_variadic(
            move |args: &[S]| {
                // Selectors never call this layer without a state.
                let Some((state, props)) = args.split_first() else {
                    unreachable!("selector layer called without a state")
                };
                let results: SmallVec<[R; 4]> = inputs
                    .iter()
                    .map(|input| input.select_with_props(state, props))
                    .collect();
                let result = output.call_variadic(&results);
                *last.borrow_mut() = Some(result.clone());
                result
            },
            options.input,
        );

        Selector {
            inner: Rc::new(SelectorInner {
                memoized,
                last_result,
                recomputations,
            }),
        }
    }

    /// Start a positional selector definition.
    pub fn builder(&self) -> SelectorBuilder<'_, S, R, O, M> {
        SelectorBuilder {
            creator: self,
            inputs: Vec::new(),
            options: None,
        }
    }
}

/// Collects inputs one by one before the combiner is supplied.
pub struct SelectorBuilder<'a, S, R, O, M = DefaultMemoizer> {
    creator: &'a SelectorCreator<S, R, O, M>,
    inputs: Vec<Input<S, R>>,
    options: Option<SelectorOptions<S, R, O>>,
}

impl<S, R, O, M> SelectorBuilder<'_, S, R, O, M>
where
    S: Clone + 'static,
    R: Clone + 'static,
    O: Clone + 'static,
    M: Memoizer,
{
    /// Append an input.
    pub fn input<I>(mut self, input: I) -> Self
    where
        I: Select<S, R> + 'static,
    {
        self.inputs.push(Rc::new(input));
        self
    }

    /// Append several inputs.
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = Input<S, R>>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Override the creator's default options.
    pub fn options(mut self, options: SelectorOptions<S, R, O>) -> Self {
        self.options = Some(options);
        self
    }

    /// Finish the selector with its combiner.
    pub fn build<C>(self, combiner: C) -> Selector<S, O>
    where
        C: Fn(&[R]) -> O + 'static,
    {
        self.creator
            .create_selector(self.inputs, combiner, self.options)
    }
}

/// Compose a selector with the default options.
pub fn create_selector<S, R, O, C>(inputs: Vec<Input<S, R>>, combiner: C) -> Selector<S, O>
where
    S: Clone + PartialEq + 'static,
    R: Clone + PartialEq + 'static,
    O: Clone + 'static,
    C: Fn(&[R]) -> O + 'static,
{
    create_selector_creator(DefaultMemoizer, SelectorOptions::equality())
        .create_selector(inputs, combiner, None)
}

/// Compose a selector with explicit options.
pub fn create_selector_with<S, R, O, C>(
    inputs: Vec<Input<S, R>>,
    combiner: C,
    options: SelectorOptions<S, R, O>,
) -> Selector<S, O>
where
    S: Clone + 'static,
    R: Clone + 'static,
    O: Clone + 'static,
    C: Fn(&[R]) -> O + 'static,
{
    create_selector_creator(DefaultMemoizer, options).create_selector(inputs, combiner, None)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
