//! The store.
//!
//! # How Dispatch Works
//!
//! 1. The action is appended to a pending queue. If the store is already
//!    dispatching (a listener dispatched from inside a notification) the call
//!    returns here and the outer dispatch picks the action up.
//!
//! 2. Each pending action is logged, then reduced against the current state.
//!
//! 3. A named store reports the transition to its [`DevContext`].
//!
//! 4. If the next state equals the current one nothing else happens.
//!    Otherwise the state is replaced and every listener is notified.
//!
//! Actions are therefore applied strictly one after the other, in the order
//! they were dispatched, and listeners never observe a state twice in a row.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::action::ActionType;
use super::dev::DevContext;
use super::reducer::Reducer;
use super::subscription::{Listeners, Subscription};
use crate::selectors::Selector;

type Recorder<S> = Box<dyn Fn(&str, &S, &S)>;

struct StoreInner<S, A> {
    name: Option<String>,
    reducer: Box<dyn Reducer<S, A>>,
    state: RefCell<S>,
    pending: RefCell<VecDeque<A>>,
    dispatching: Cell<bool>,
    destroyed: Cell<bool>,
    actions: RefCell<Vec<A>>,
    listeners: Listeners<S>,
    recorder: Option<Recorder<S>>,
}

impl<S: 'static, A> StoreInner<S, A> {
    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        debug!(store = self.name.as_deref(), "destroying store");
        self.pending.borrow_mut().clear();
        self.listeners.clear();
    }
}

/// Resets the dispatching flag even if a reducer or listener panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A unidirectional state container.
///
/// Clones share the same state.
pub struct Store<S, A> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + PartialEq + 'static,
    A: ActionType + Clone + 'static,
{
    /// Create a store starting from `initial`.
    pub fn new<R>(reducer: R, initial: S) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self::build(reducer, initial, None, None)
    }

    /// Create a store registered in `dev` under `name`.
    pub fn named<R>(reducer: R, initial: S, name: &str, dev: &DevContext) -> Self
    where
        R: Reducer<S, A> + 'static,
        S: Serialize,
    {
        let recorder_dev = dev.clone();
        let store_name = name.to_string();
        let recorder: Recorder<S> = Box::new(move |action_type: &str, previous: &S, next: &S| {
            recorder_dev.record(&store_name, action_type, previous, next);
        });

        let store = Self::build(reducer, initial, Some(name.to_string()), Some(recorder));
        let weak: Weak<StoreInner<S, A>> = Rc::downgrade(&store.inner);
        dev.register(name, move || {
            if let Some(inner) = weak.upgrade() {
                inner.destroy();
            }
        });
        store
    }

    fn build<R>(reducer: R, initial: S, name: Option<String>, recorder: Option<Recorder<S>>) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        debug!(store = name.as_deref(), "creating store");
        Self {
            inner: Rc::new(StoreInner {
                name,
                reducer: Box::new(reducer),
                state: RefCell::new(initial),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                destroyed: Cell::new(false),
                actions: RefCell::new(Vec::new()),
                listeners: Listeners::new(),
                recorder,
            }),
        }
    }

    /// Dispatch an action.
    ///
    /// Ignored once the store is destroyed.
    pub fn dispatch(&self, action: A) {
        if self.inner.destroyed.get() {
            trace!(action = action.action_type(), "dispatch on destroyed store");
            return;
        }
        self.inner.pending.borrow_mut().push_back(action);
        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);
        let _guard = DispatchGuard(&self.inner.dispatching);
        loop {
            if self.inner.destroyed.get() {
                break;
            }
            let next_action = self.inner.pending.borrow_mut().pop_front();
            match next_action {
                Some(action) => self.apply(action),
                None => break,
            }
        }
    }

    /// Dispatch several actions, in order.
    pub fn dispatch_all(&self, actions: impl IntoIterator<Item = A>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Wrap an action constructor into a dispatching function.
    pub fn dispatcher<P, F>(&self, create: F) -> impl Fn(P)
    where
        F: Fn(P) -> A,
    {
        let store = self.clone();
        move |payload| store.dispatch(create(payload))
    }

    fn apply(&self, action: A) {
        self.inner.actions.borrow_mut().push(action.clone());

        let (next, changed) = {
            let state = self.inner.state.borrow();
            let next = self.inner.reducer.reduce(&*state, &action);
            if let Some(record) = &self.inner.recorder {
                record(action.action_type(), &*state, &next);
            }
            let changed = *state != next;
            (next, changed)
        };

        if !changed {
            trace!(action = action.action_type(), "state unchanged");
            return;
        }

        self.inner.state.replace(next.clone());
        debug!(
            store = self.inner.name.as_deref(),
            action = action.action_type(),
            "state changed"
        );
        self.inner.listeners.notify(&next);
    }

    /// Subscribe to state changes.
    ///
    /// The listener is called right away with the current state, then on
    /// every change until the subscription is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S) + 'static,
    {
        if self.inner.destroyed.get() {
            return Subscription::inert();
        }
        let subscription = self.inner.listeners.add(listener);
        let current = self.state();
        self.inner.listeners.notify_one(subscription.id(), &current);
        subscription
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + 'static,
{
    /// A copy of the current state.
    pub fn state(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Derive a value from the current state.
    pub fn select<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        f(&*self.inner.state.borrow())
    }

    /// Derive a value with a memoized selector.
    pub fn select_with<O>(&self, selector: &Selector<S, O>) -> O
    where
        O: Clone + 'static,
    {
        let state = self.state();
        selector.select(&state)
    }

    /// Select a property of the serialized state by dotted path.
    ///
    /// An empty path selects the whole state.
    pub fn select_path(&self, path: &str) -> Option<Value>
    where
        S: Serialize,
    {
        let root = serde_json::to_value(&*self.inner.state.borrow()).ok()?;
        if path.is_empty() {
            return Some(root);
        }
        path.split('.')
            .try_fold(root, |value, key| match value {
                Value::Object(mut map) => map.remove(key),
                Value::Array(mut items) => {
                    let index = key.parse::<usize>().ok()?;
                    (index < items.len()).then(|| items.swap_remove(index))
                }
                _ => None,
            })
    }
}

impl<S: 'static, A> Store<S, A> {
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Every action dispatched so far, in dispatch order.
    pub fn actions(&self) -> Vec<A>
    where
        A: Clone,
    {
        self.inner.actions.borrow().clone()
    }

    /// Dispatched actions of one type.
    pub fn actions_of_type(&self, action_type: &str) -> Vec<A>
    where
        A: ActionType + Clone,
    {
        self.inner
            .actions
            .borrow()
            .iter()
            .filter(|action| action.action_type() == action_type)
            .cloned()
            .collect()
    }

    /// Stop the store: pending actions and listeners are dropped and later
    /// dispatches are ignored.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("state", &*self.inner.state.borrow())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::{create_selector, input};
    use crate::store::action::Action;
    use crate::store::reducer::ReducerMap;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Counter {
        count: i32,
        history: Vec<i32>,
    }

    fn counter_store() -> Store<Counter, Action<i32>> {
        let reducer = ReducerMap::new()
            .on("[INCREMENT]", |state: &Counter, _: &Action<i32>| Counter {
                count: state.count + 1,
                history: state.history.clone(),
            })
            .on("[ADD]", |state: &Counter, action: &Action<i32>| {
                let amount = action.payload().copied().unwrap_or_default();
                let mut history = state.history.clone();
                history.push(amount);
                Counter {
                    count: state.count + amount,
                    history,
                }
            });
        Store::new(
            reducer,
            Counter {
                count: 0,
                history: Vec::new(),
            },
        )
    }

    fn recorder(store: &Store<Counter, Action<i32>>) -> (Rc<RefCell<Vec<i32>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let subscription = store.subscribe(move |state: &Counter| {
            seen_clone.borrow_mut().push(state.count);
        });
        (seen, subscription)
    }

    #[test]
    fn dispatch_reduces_state() {
        let store = counter_store();
        store.dispatch(Action::new("[INCREMENT]"));
        store.dispatch(Action::with_payload("[ADD]", 5));

        assert_eq!(store.state().count, 6);
        assert_eq!(store.select(|s| s.history.clone()), vec![5]);
    }

    #[test]
    fn subscribe_replays_current_state() {
        let store = counter_store();
        store.dispatch(Action::new("[INCREMENT]"));

        let (seen, _subscription) = recorder(&store);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn listeners_skip_unchanged_states() {
        let store = counter_store();
        let (seen, _subscription) = recorder(&store);

        store.dispatch(Action::new("[UNKNOWN]"));
        store.dispatch(Action::with_payload("[ADD]", 0));
        store.dispatch(Action::new("[INCREMENT]"));

        // Adding zero still changes the history.
        assert_eq!(*seen.borrow(), vec![0, 0, 1]);
        assert_eq!(store.actions().len(), 3);
    }

    #[test]
    fn nested_dispatch_is_queued() {
        let store = counter_store();
        let (seen, _subscription) = recorder(&store);

        let inner = store.clone();
        let _chained = store.subscribe(move |state: &Counter| {
            if state.count == 1 {
                inner.dispatch(Action::with_payload("[ADD]", 10));
            }
        });

        store.dispatch(Action::new("[INCREMENT]"));
        assert_eq!(*seen.borrow(), vec![0, 1, 11]);
        assert_eq!(store.state().count, 11);

        // Breaks the store <-> listener cycle.
        store.destroy();
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let store = counter_store();
        let (seen, subscription) = recorder(&store);

        store.dispatch(Action::new("[INCREMENT]"));
        drop(subscription);
        store.dispatch(Action::new("[INCREMENT]"));

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn destroyed_store_ignores_dispatch() {
        let store = counter_store();
        let (seen, _subscription) = recorder(&store);

        store.destroy();
        store.dispatch(Action::new("[INCREMENT]"));

        assert!(store.is_destroyed());
        assert_eq!(store.state().count, 0);
        assert_eq!(*seen.borrow(), vec![0]);
        assert!(store.actions().is_empty());
    }

    #[test]
    fn actions_of_type_filters_log() {
        let store = counter_store();
        store.dispatch_all([
            Action::new("[INCREMENT]"),
            Action::with_payload("[ADD]", 2),
            Action::new("[INCREMENT]"),
        ]);

        assert_eq!(store.actions_of_type("[INCREMENT]").len(), 2);
        assert_eq!(
            store.actions_of_type("[ADD]"),
            vec![Action::with_payload("[ADD]", 2)]
        );
    }

    #[test]
    fn dispatcher_wraps_action_constructor() {
        let store = counter_store();
        let add = store.dispatcher(|amount: i32| Action::with_payload("[ADD]", amount));

        add(3);
        add(4);
        assert_eq!(store.state().count, 7);
    }

    #[test]
    fn select_with_memoized_selector() {
        let store = counter_store();
        let select_doubled = create_selector(
            vec![input(|s: &Counter| s.count)],
            |values: &[i32]| values[0] * 2,
        );

        store.dispatch(Action::new("[INCREMENT]"));
        assert_eq!(store.select_with(&select_doubled), 2);
        assert_eq!(store.select_with(&select_doubled), 2);
        assert_eq!(select_doubled.recomputations(), 1);
    }

    #[test]
    fn select_path_walks_serialized_state() {
        let store = counter_store();
        store.dispatch(Action::with_payload("[ADD]", 4));

        assert_eq!(store.select_path("count"), Some(json!(4)));
        assert_eq!(store.select_path("history.0"), Some(json!(4)));
        assert_eq!(store.select_path("history.3"), None);
        assert_eq!(store.select_path("missing.key"), None);
        assert_eq!(
            store.select_path(""),
            Some(json!({"count": 4, "history": [4]}))
        );
    }

    #[test]
    fn named_store_records_changes() {
        let dev = DevContext::new();
        dev.init();

        let store = Store::named(
            |state: &i32, action: &&str| match *action {
                "[INCREMENT]" => state + 1,
                _ => *state,
            },
            0,
            "counter",
            &dev,
        );
        assert_eq!(store.name(), Some("counter"));

        store.dispatch("[INCREMENT]");
        store.dispatch("[NOOP]");

        let changes = dev.changes_for("counter");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].previous, json!(0));
        assert_eq!(changes[0].next, json!(1));
        assert_eq!(changes[1].action_type, "[NOOP]");

        dev.destroy_all();
        assert!(store.is_destroyed());
    }

    #[test]
    fn panicking_listener_does_not_wedge_store() {
        use std::panic::{self, AssertUnwindSafe};

        let store = counter_store();
        let _subscription = store.subscribe(|state: &Counter| {
            if state.count == 1 {
                panic!("listener failed");
            }
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            store.dispatch(Action::new("[INCREMENT]"));
        }));
        assert!(result.is_err());

        store.dispatch(Action::new("[INCREMENT]"));
        assert_eq!(store.state().count, 2);
    }
}
