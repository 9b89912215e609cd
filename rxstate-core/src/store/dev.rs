//! Development registry.
//!
//! A [`DevContext`] is passed explicitly to named stores. While initialized
//! it records every reduced action as a [`StateChange`] holding JSON
//! snapshots of the states before and after, which makes state histories
//! easy to dump or diff. It also keeps track of registered stores so they
//! can be torn down together.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// One reduced action of a named store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub store: String,
    pub action_type: String,
    pub previous: Value,
    pub next: Value,
}

#[derive(Default)]
struct DevInner {
    enabled: Cell<bool>,
    changes: RefCell<Vec<StateChange>>,
    stores: RefCell<IndexMap<String, Box<dyn Fn()>>>,
}

/// Registry of named stores and their state history.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct DevContext {
    inner: Rc<DevInner>,
}

impl DevContext {
    /// A context that records nothing until [`init`](Self::init).
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording state changes.
    pub fn init(&self) {
        debug!("dev context initialized");
        self.inner.enabled.set(true);
    }

    /// Stop recording and forget recorded changes and registered stores.
    ///
    /// Stores stay alive; use [`destroy_all`](Self::destroy_all) first to
    /// shut them down.
    pub fn teardown(&self) {
        debug!(
            stores = self.inner.stores.borrow().len(),
            "dev context teardown"
        );
        self.inner.enabled.set(false);
        self.inner.changes.borrow_mut().clear();
        self.inner.stores.borrow_mut().clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Every recorded change, oldest first.
    pub fn changes(&self) -> Vec<StateChange> {
        self.inner.changes.borrow().clone()
    }

    /// Recorded changes of one store, oldest first.
    pub fn changes_for(&self, store: &str) -> Vec<StateChange> {
        self.inner
            .changes
            .borrow()
            .iter()
            .filter(|change| change.store == store)
            .cloned()
            .collect()
    }

    /// Names of the registered stores, in registration order.
    pub fn store_names(&self) -> Vec<String> {
        self.inner.stores.borrow().keys().cloned().collect()
    }

    /// Destroy every registered store and unregister them.
    pub fn destroy_all(&self) {
        let stores = std::mem::take(&mut *self.inner.stores.borrow_mut());
        debug!(stores = stores.len(), "destroying registered stores");
        for destroy in stores.values() {
            destroy();
        }
    }

    /// Register a store under `name`. A store already registered under the
    /// same name is replaced.
    pub(crate) fn register<F>(&self, name: &str, destroy: F)
    where
        F: Fn() + 'static,
    {
        debug!(store = name, "registering store");
        let mut stores = self.inner.stores.borrow_mut();
        stores.shift_remove(name);
        stores.insert(name.to_string(), Box::new(destroy));
    }

    pub(crate) fn record<S: Serialize>(
        &self,
        store: &str,
        action_type: &str,
        previous: &S,
        next: &S,
    ) {
        if !self.is_initialized() {
            return;
        }
        let change = StateChange {
            store: store.to_string(),
            action_type: action_type.to_string(),
            previous: snapshot(previous),
            next: snapshot(next),
        };
        self.inner.changes.borrow_mut().push(change);
    }
}

fn snapshot<S: Serialize>(state: &S) -> Value {
    serde_json::to_value(state).unwrap_or_else(|err| {
        warn!(error = %err, "state snapshot failed");
        Value::Null
    })
}

impl fmt::Debug for DevContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevContext")
            .field("initialized", &self.is_initialized())
            .field("stores", &self.store_names())
            .field("changes", &self.inner.changes.borrow().len())
            .finish()
    }
}
