//! State Store
//!
//! A small unidirectional state container built on top of the selectors.
//!
//! # Concepts
//!
//! ## Actions
//!
//! An action names a transition by its type string and may carry a payload.
//! Three action types are reserved: `[ASYNC_ACTION]`, `[ERROR_ACTION]` and
//! `[RESET_STATE]`.
//!
//! ## Reducers
//!
//! A reducer is a pure function from the current state and an action to the
//! next state. [`ReducerMap`] dispatches on the action type and leaves the
//! state untouched for types it does not know.
//!
//! ## Stores
//!
//! A [`Store`] owns the state. Dispatched actions are reduced one at a time
//! and listeners only hear about states that actually changed. Derived values
//! are read with plain closures or with memoized selectors.
//!
//! ## Development registry
//!
//! Stores created with [`Store::named`] register in a [`DevContext`], which
//! records their state history while initialized and can destroy them all at
//! once.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded: stores share their state through `Rc`
//! and `RefCell`, and are neither `Send` nor `Sync`.

mod action;
mod dev;
mod flux;
mod reducer;
mod subscription;

pub use action::{Action, ActionType, ASYNC_ACTION, ERROR_ACTION, RESET_STATE};
pub use dev::{DevContext, StateChange};
pub use flux::Store;
pub use reducer::{create_reducer, Handler, Reducer, ReducerMap};
pub use subscription::{ListenerId, Listeners, Subscription};
