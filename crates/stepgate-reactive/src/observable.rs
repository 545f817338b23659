#![forbid(unsafe_code)]

//! Mutable cells with synchronous change notification.
//!
//! # Design
//!
//! [`Observable<T>`] is a cloneable handle to a shared node holding an
//! optional value, a version counter and a list of subscribers. Subscribers
//! are stored as `Weak` callbacks; the strong side lives in the
//! [`Subscription`] returned to the caller, so dropping the guard is all it
//! takes to unsubscribe. Dead entries are pruned lazily on the next `set`.
//!
//! # Invariants
//!
//! 1. Every `set` bumps the version by exactly 1 and notifies each live
//!    subscriber exactly once, in registration order.
//! 2. Identical writes are delivered like any other write (no dedup).
//! 3. `subscribe` invokes the callback immediately with the current value if
//!    the cell is initialized, and never with "no value".
//! 4. Dropping a node back to "no value" reaches every internal watcher, so
//!    derived nodes and bound cells downstream drop back too.
//! 5. Re-entrant `set` calls made from inside a callback are delivered
//!    depth-first, in the order they occur.
//! 6. A cell carries at most one one-way binding at a time.
//!
//! # Failure Modes
//!
//! - **Read before init**: `get()` returns [`ReactiveError::Uninitialized`].
//! - **Double bind**: `bind()` panics; `try_bind()` returns
//!   [`ReactiveError::AlreadyBound`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::derived::{Derived, Source};
use crate::error::{ReactiveError, Result};
use crate::logging::{debug, trace};

/// Internal watchers also hear about the node dropping back to "no value".
type Callback<T> = Rc<dyn Fn(Option<&T>)>;

/// Shared storage behind [`Observable`] and [`Derived`] handles.
pub(crate) struct Node<T> {
    /// `None` until the first value propagates.
    value: Option<T>,
    /// Bumped on every publish, including identical writes.
    version: u64,
    subscribers: Vec<Weak<dyn Fn(Option<&T>)>>,
    /// Guard for the one-way binding driving this node, if any.
    binding: Option<Box<dyn Any>>,
    /// Upstream handles and subscriptions this node depends on. Never read,
    /// only kept alive for the lifetime of the node.
    retained: Vec<Box<dyn Any>>,
}

pub(crate) type NodeRef<T> = Rc<RefCell<Node<T>>>;

impl<T> Node<T> {
    pub(crate) fn new(value: Option<T>) -> NodeRef<T> {
        Rc::new(RefCell::new(Self {
            value,
            version: 0,
            subscribers: Vec::new(),
            binding: None,
            retained: Vec::new(),
        }))
    }

    pub(crate) fn value_ref(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub(crate) fn version_number(&self) -> u64 {
        self.version
    }

    fn live_subscribers(&mut self) -> Vec<Callback<T>> {
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        self.subscribers.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Store `value` and deliver it to every live subscriber.
///
/// The node borrow is released before any callback runs, so callbacks may
/// freely read or write this node again.
pub(crate) fn publish<T: Clone + 'static>(node: &NodeRef<T>, value: T) {
    let (value, live) = {
        let mut inner = node.borrow_mut();
        inner.value = Some(value.clone());
        inner.version += 1;
        let live = inner.live_subscribers();
        trace!(version = inner.version, subscribers = live.len(), "publish");
        (value, live)
    };
    for callback in live {
        callback(Some(&value));
    }
}

/// Drop back to "no value" and tell every live watcher.
///
/// A node that already has no value is left alone. The version is not
/// bumped.
pub(crate) fn invalidate<T: 'static>(node: &NodeRef<T>) {
    let live = {
        let mut inner = node.borrow_mut();
        if inner.value.take().is_none() {
            return;
        }
        inner.live_subscribers()
    };
    trace!(subscribers = live.len(), "invalidate");
    for callback in live {
        callback(None);
    }
}

/// Register a watcher that sees both values and invalidations.
///
/// Like [`subscribe`], the current value is pushed right away if there is
/// one.
pub(crate) fn watch<T: Clone + 'static>(
    node: &NodeRef<T>,
    callback: impl Fn(Option<&T>) + 'static,
) -> Subscription {
    let callback: Callback<T> = Rc::new(callback);
    let current = {
        let mut inner = node.borrow_mut();
        inner.subscribers.push(Rc::downgrade(&callback));
        inner.value.clone()
    };
    if let Some(value) = current {
        callback(Some(&value));
    }
    Subscription::new(callback)
}

pub(crate) fn subscribe<T: Clone + 'static>(
    node: &NodeRef<T>,
    callback: impl Fn(&T) + 'static,
) -> Subscription {
    watch(node, move |value: Option<&T>| {
        if let Some(value) = value {
            callback(value);
        }
    })
}

/// A watcher that copies every emission of its source onto `target`,
/// invalidations included.
pub(crate) fn mirror<T: Clone + 'static>(
    target: Weak<RefCell<Node<T>>>,
) -> impl Fn(Option<&T>) + 'static {
    move |value: Option<&T>| {
        let Some(node) = target.upgrade() else {
            return;
        };
        match value {
            Some(value) => publish(&node, value.clone()),
            None => invalidate(&node),
        }
    }
}

pub(crate) fn retain<T>(node: &NodeRef<T>, item: impl Any) {
    node.borrow_mut().retained.push(Box::new(item));
}

pub(crate) fn try_get<T: Clone>(node: &NodeRef<T>) -> Option<T> {
    node.borrow().value.clone()
}

pub(crate) fn version<T>(node: &NodeRef<T>) -> u64 {
    node.borrow().version
}

pub(crate) fn subscriber_count<T>(node: &NodeRef<T>) -> usize {
    node.borrow()
        .subscribers
        .iter()
        .filter(|weak| weak.strong_count() > 0)
        .count()
}

/// RAII guard for a subscriber callback.
///
/// The callback stays registered exactly as long as this guard is alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    fn new<T: 'static>(callback: Callback<T>) -> Self {
        Self {
            _guard: Box::new(callback),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// A shared, mutable cell that notifies subscribers on every write.
///
/// Cloning an `Observable` creates a new handle to the **same** cell.
pub struct Observable<T> {
    node: NodeRef<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.node.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("bound", &inner.binding.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::uninit()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            node: Node::new(Some(value)),
        }
    }

    /// Create a cell with no value yet.
    ///
    /// Nothing downstream runs until the first `set`.
    #[must_use]
    pub fn uninit() -> Self {
        Self {
            node: Node::new(None),
        }
    }

    /// Current value.
    pub fn get(&self) -> Result<T> {
        try_get(&self.node).ok_or(ReactiveError::Uninitialized)
    }

    /// Current value, or `None` before the first `set`.
    #[must_use]
    pub fn try_get(&self) -> Option<T> {
        try_get(&self.node)
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls `set` on this same cell.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.node.borrow().value.as_ref())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.node.borrow().value.is_some()
    }

    /// Number of writes so far. Starts at 0 regardless of the initial value.
    #[must_use]
    pub fn version(&self) -> u64 {
        version(&self.node)
    }

    /// Write a new value and notify every subscriber before returning.
    pub fn set(&self, value: T) {
        publish(&self.node, value);
    }

    /// Read-modify-write.
    ///
    /// `f` runs on a copy of the current value with no borrow held, so it
    /// may touch this cell. Its result is written last and wins.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        let current = self.get()?;
        self.set(f(&current));
        Ok(())
    }

    /// Register a callback, invoking it right away with the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        subscribe(&self.node, callback)
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        subscriber_count(&self.node)
    }

    /// Drive this cell from `source`, one way.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already bound. Use [`try_bind`](Self::try_bind)
    /// for the checked form.
    pub fn bind(&self, source: &impl Source<T>) {
        if let Err(err) = self.try_bind(source) {
            panic!("Observable::bind: {err}");
        }
    }

    /// Drive this cell from `source`, one way, failing if already bound.
    ///
    /// The source is kept alive by the binding. The cell can still be `set`
    /// directly; the next emission from the source overwrites it. If the
    /// source drops back to "no value", so does this cell.
    pub fn try_bind(&self, source: &impl Source<T>) -> Result<()> {
        if self.is_bound() {
            return Err(ReactiveError::AlreadyBound);
        }
        let source = source.to_derived();
        let sub = source.watch(mirror(Rc::downgrade(&self.node)));
        debug!(message = "observable.bind", initialized = source.is_initialized());
        self.node.borrow_mut().binding = Some(Box::new((source, sub)));
        Ok(())
    }

    /// Release the current binding, if any. The cell keeps its last value.
    pub fn unbind(&self) {
        let previous = self.node.borrow_mut().binding.take();
        drop(previous);
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.node.borrow().binding.is_some()
    }

    /// A read-only handle onto this same cell.
    #[must_use]
    pub fn read_only(&self) -> Derived<T> {
        Derived::from_node(Rc::clone(&self.node))
    }
}

impl<T: Clone + 'static> Source<T> for Observable<T> {
    fn to_derived(&self) -> Derived<T> {
        self.read_only()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
