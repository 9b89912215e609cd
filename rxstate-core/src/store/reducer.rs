//! Reducers.
//!
//! A reducer computes the next state from the current one and an action. Any
//! `Fn(&S, &A) -> S` is a reducer; [`ReducerMap`] builds one from per-type
//! handlers.

use std::fmt;

use indexmap::IndexMap;

use super::action::ActionType;

/// Computes the next state.
pub trait Reducer<S, A> {
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

/// A boxed per-type handler.
pub type Handler<S, A> = Box<dyn Fn(&S, &A) -> S>;

/// A reducer dispatching on the action type.
///
/// Actions with no registered handler leave the state unchanged.
pub struct ReducerMap<S, A> {
    handlers: IndexMap<String, Handler<S, A>>,
}

impl<S, A> ReducerMap<S, A> {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Register `handler` for `action_type`, replacing any previous one.
    pub fn on<F>(mut self, action_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &A) -> S + 'static,
    {
        self.handlers.insert(action_type.into(), Box::new(handler));
        self
    }

    /// Check if a handler is registered for `action_type`.
    pub fn handles(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    /// Registered action types, in registration order.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl<S, A> Default for ReducerMap<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for ReducerMap<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

impl<S, A> Reducer<S, A> for ReducerMap<S, A>
where
    S: Clone,
    A: ActionType,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        match self.handlers.get(action.action_type()) {
            Some(handler) => handler(state, action),
            None => state.clone(),
        }
    }
}

/// Build a reducer from `(action type, handler)` pairs.
pub fn create_reducer<S, A, K, I>(handlers: I) -> ReducerMap<S, A>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Handler<S, A>)>,
{
    ReducerMap {
        handlers: handlers
            .into_iter()
            .map(|(action_type, handler)| (action_type.into(), handler))
            .collect(),
    }
}
