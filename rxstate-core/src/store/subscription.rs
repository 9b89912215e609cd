//! State listeners and their subscriptions.
//!
//! A listener is a callback receiving every new state of a store. Listeners
//! are owned by a [`Listeners`] registry; callers hold a [`Subscription`]
//! that removes the listener when dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

/// Unique identifier for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

type Listener<S> = Rc<dyn Fn(&S)>;

/// Registered listeners in subscription order.
pub struct Listeners<S> {
    entries: Rc<RefCell<IndexMap<ListenerId, Listener<S>>>>,
}

impl<S: 'static> Listeners<S> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Register `listener`.
    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S) + 'static,
    {
        let id = ListenerId::new();
        self.entries.borrow_mut().insert(id, Rc::new(listener));

        let entries: Weak<RefCell<IndexMap<ListenerId, Listener<S>>>> =
            Rc::downgrade(&self.entries);
        Subscription {
            id,
            cancel: Some(Box::new(move || {
                if let Some(entries) = entries.upgrade() {
                    entries.borrow_mut().shift_remove(&id);
                }
            })),
        }
    }

    /// Call every listener with `state`.
    ///
    /// Listeners added or removed during the notification take effect on the
    /// next one.
    pub fn notify(&self, state: &S) {
        let snapshot: Vec<Listener<S>> = self.entries.borrow().values().cloned().collect();
        for listener in snapshot {
            listener(state);
        }
    }

    /// Call the listener `id` only.
    pub fn notify_one(&self, id: ListenerId, state: &S) {
        let listener = self.entries.borrow().get(&id).cloned();
        if let Some(listener) = listener {
            listener(state);
        }
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: 'static> Default for Listeners<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a listener registered.
///
/// Dropping the subscription removes the listener.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: ListenerId,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription attached to nothing.
    pub(crate) fn inert() -> Self {
        Self {
            id: ListenerId::new(),
            cancel: None,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Keep the listener registered for the lifetime of its store.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
