//! RxState Core
//!
//! This crate provides memoized selectors and a unidirectional state store.
//! It implements:
//!
//! - Argument-keyed memoization with pluggable cache strategies
//! - Selector composition with two layers of memoization
//! - A reducer-driven store with change listeners and a development registry
//!
//! # Architecture
//!
//! The crate is organized into these modules:
//!
//! - `selectors`: caches, memoized functions and the selector composer
//! - `store`: actions, reducers, stores and subscriptions
//! - `error`: configuration errors
//!
//! # Example
//!
//! ```rust
//! use rxstate_core::selectors::{create_selector, input};
//! use rxstate_core::store::{Action, ReducerMap, Store};
//!
//! #[derive(Clone, PartialEq)]
//! struct Todos {
//!     items: Vec<(String, bool)>,
//! }
//!
//! let reducer = ReducerMap::new().on("[ADD]", |state: &Todos, action: &Action<String>| {
//!     let mut items = state.items.clone();
//!     if let Some(title) = action.payload() {
//!         items.push((title.clone(), false));
//!     }
//!     Todos { items }
//! });
//! let store = Store::new(reducer, Todos { items: Vec::new() });
//!
//! let select_open = create_selector(
//!     vec![input(|todos: &Todos| todos.items.clone())],
//!     |items: &[Vec<(String, bool)>]| items[0].iter().filter(|(_, done)| !done).count(),
//! );
//!
//! store.dispatch(Action::with_payload("[ADD]", "write docs".to_string()));
//! assert_eq!(store.select_with(&select_open), 1);
//! ```

pub mod error;
pub mod selectors;
pub mod store;

pub use error::ConfigError;
pub use selectors::{create_selector, memoize, MemoizeOptions, Memoized, Selector};
pub use store::{Action, Store};
