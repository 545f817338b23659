#![forbid(unsafe_code)]

//! Derived values that recompute eagerly from their sources.
//!
//! # Design
//!
//! [`Derived<T>`] is a read-only handle onto the same node type that backs
//! [`Observable`]. A derived node subscribes to each of its sources and, on
//! every notification, recomputes and publishes its own value before the
//! source's `set` returns. The node retains its upstream handles and
//! subscriptions, so keeping any downstream handle alive keeps the whole
//! chain alive.
//!
//! # Invariants
//!
//! 1. While any source has no value, the compute function is not called and
//!    the derived value is uninitialized. A source dropping back to "no
//!    value" drops every dependent back too, and they recompute on the next
//!    emission.
//! 2. Combinators read the *latest* value of every source at recompute time.
//! 3. `select` releases the previous inner subscription before following the
//!    next inner value.
//! 4. No glitch-freedom: a node reachable from one cell along two paths is
//!    recomputed once per path, and may briefly expose a value built from a
//!    mix of old and new inputs. Callers comparing several derived values of
//!    the same cell must tolerate this.
//!
//! # Failure Modes
//!
//! - **Compute function panics**: the panic unwinds through the `set` that
//!   triggered it; the node keeps its previous value.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{ReactiveError, Result};
use crate::logging::debug;
use crate::observable::{self, Node, NodeRef, Observable, Subscription};

/// Anything that can be read, subscribed to and composed.
///
/// Implemented by [`Observable`] and [`Derived`].
pub trait Source<T: Clone + 'static>: Clone + 'static {
    /// A read-only handle sharing this source's node.
    fn to_derived(&self) -> Derived<T>;

    /// Derive a value by applying `f` to every emission.
    fn map<U, F>(&self, f: F) -> Derived<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let source = self.to_derived();
        let out: NodeRef<U> = Node::new(None);
        let target = Rc::downgrade(&out);
        let sub = source.watch(move |value: Option<&T>| {
            let Some(node) = target.upgrade() else {
                return;
            };
            match value {
                Some(value) => observable::publish(&node, f(value)),
                None => observable::invalidate(&node),
            }
        });
        observable::retain(&out, source);
        observable::retain(&out, sub);
        Derived::from_node(out)
    }

    /// Follow whichever inner value `f` selects for the current emission.
    ///
    /// Each time this source changes, the previous inner subscription is
    /// released and the newly selected inner value is followed instead.
    /// While the followed inner value (or this source) has no value, neither
    /// does the result.
    fn select<U, F>(&self, f: F) -> Derived<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> Derived<U> + 'static,
    {
        let source = self.to_derived();
        let out: NodeRef<U> = Node::new(None);
        let state = Rc::new(SelectState::<U> {
            generation: Cell::new(0),
            current: RefCell::new(None),
        });

        let target = Rc::downgrade(&out);
        let weak_state = Rc::downgrade(&state);
        let sub = source.watch(move |value: Option<&T>| {
            let (Some(out), Some(state)) = (target.upgrade(), weak_state.upgrade()) else {
                return;
            };
            let generation = state.generation.get() + 1;
            state.generation.set(generation);

            let previous = state.current.borrow_mut().take();
            drop(previous);

            let Some(value) = value else {
                observable::invalidate(&out);
                return;
            };
            let inner = f(value);
            if !inner.is_initialized() {
                observable::invalidate(&out);
            }
            debug!(
                message = "select.switch",
                generation,
                initialized = inner.is_initialized()
            );
            let inner_sub = inner.watch(observable::mirror(Rc::downgrade(&out)));
            // A re-entrant emission may already have switched to a newer
            // inner value while we were subscribing; keep only the newest.
            if state.generation.get() == generation {
                *state.current.borrow_mut() = Some((inner, inner_sub));
            }
        });

        observable::retain(&out, source);
        observable::retain(&out, state);
        observable::retain(&out, sub);
        Derived::from_node(out)
    }
}

struct SelectState<U> {
    generation: Cell<u64>,
    current: RefCell<Option<(Derived<U>, Subscription)>>,
}

/// A read-only value kept up to date from one or more sources.
///
/// Cloning a `Derived` creates a new handle to the **same** node.
pub struct Derived<T> {
    node: NodeRef<T>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.node.borrow();
        f.debug_struct("Derived")
            .field("value", &inner.value_ref())
            .field("version", &inner.version_number())
            .finish()
    }
}

impl<T: Clone + 'static> Derived<T> {
    pub(crate) fn from_node(node: NodeRef<T>) -> Self {
        Self { node }
    }

    /// A derived value that never changes.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Observable::new(value).read_only()
    }

    /// Current value.
    pub fn get(&self) -> Result<T> {
        observable::try_get(&self.node).ok_or(ReactiveError::Uninitialized)
    }

    /// Current value, or `None` while any source is still uninitialized.
    #[must_use]
    pub fn try_get(&self) -> Option<T> {
        observable::try_get(&self.node)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.node.borrow().value_ref().is_some()
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        observable::version(&self.node)
    }

    /// Register a callback, invoking it right away with the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        observable::subscribe(&self.node, callback)
    }

    /// Like [`subscribe`](Self::subscribe), but also called with `None` when
    /// this value drops back to uninitialized.
    pub(crate) fn watch(&self, callback: impl Fn(Option<&T>) + 'static) -> Subscription {
        observable::watch(&self.node, callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        observable::subscriber_count(&self.node)
    }

    /// Combine two sources. Recomputes whenever either changes, once both
    /// have a value.
    pub fn combine2<A, B>(
        a: &impl Source<A>,
        b: &impl Source<B>,
        f: impl Fn(&A, &B) -> T + 'static,
    ) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
    {
        let a = a.to_derived();
        let b = b.to_derived();
        let (sa, sb) = (a.clone(), b.clone());
        let deps = vec![upstream(a), upstream(b)];
        Self::wire(deps, move || {
            let (Some(va), Some(vb)) = (sa.try_get(), sb.try_get()) else {
                return None;
            };
            Some(f(&va, &vb))
        })
    }

    /// Combine three sources. Recomputes whenever any changes, once all have
    /// a value.
    pub fn combine3<A, B, C>(
        a: &impl Source<A>,
        b: &impl Source<B>,
        c: &impl Source<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
    {
        let a = a.to_derived();
        let b = b.to_derived();
        let c = c.to_derived();
        let (sa, sb, sc) = (a.clone(), b.clone(), c.clone());
        let deps = vec![upstream(a), upstream(b), upstream(c)];
        Self::wire(deps, move || {
            let (Some(va), Some(vb), Some(vc)) = (sa.try_get(), sb.try_get(), sc.try_get())
            else {
                return None;
            };
            Some(f(&va, &vb, &vc))
        })
    }

    /// Combine any number of same-typed sources.
    ///
    /// With no sources, `f(&[])` is computed once and never changes.
    pub fn combine_all<S>(sources: Vec<Derived<S>>, f: impl Fn(&[S]) -> T + 'static) -> Self
    where
        S: Clone + 'static,
    {
        let reads = sources.clone();
        let deps = sources.into_iter().map(upstream).collect();
        Self::wire(deps, move || {
            let values: Option<Vec<S>> = reads.iter().map(Derived::try_get).collect();
            values.map(|values| f(&values))
        })
    }

    /// Subscribe `compute` to every upstream node and publish its result.
    ///
    /// The initial computation runs once, after all subscriptions exist, so
    /// construction never sees a half-wired graph.
    fn wire(upstream: Vec<Box<dyn Upstream>>, compute: impl Fn() -> Option<T> + 'static) -> Self {
        let out: NodeRef<T> = Node::new(None);
        let armed = Rc::new(Cell::new(false));

        let recompute: Rc<dyn Fn()> = {
            let target = Rc::downgrade(&out);
            let armed = Rc::clone(&armed);
            Rc::new(move || {
                if !armed.get() {
                    return;
                }
                let Some(node) = target.upgrade() else {
                    return;
                };
                match compute() {
                    Some(value) => observable::publish(&node, value),
                    None => observable::invalidate(&node),
                }
            })
        };

        for source in upstream {
            let sub = source.on_change(Rc::clone(&recompute));
            observable::retain(&out, sub);
            observable::retain(&out, source);
        }
        armed.set(true);
        recompute();
        observable::retain(&out, recompute);
        Self::from_node(out)
    }
}

impl<T: Clone + 'static> Source<T> for Derived<T> {
    fn to_derived(&self) -> Derived<T> {
        self.clone()
    }
}

/// Type-erased "tell me when you change" used to wire heterogeneous sources.
trait Upstream {
    fn on_change(&self, callback: Rc<dyn Fn()>) -> Subscription;
}

fn upstream<S: Clone + 'static>(source: Derived<S>) -> Box<dyn Upstream> {
    Box::new(source)
}

impl<S: Clone + 'static> Upstream for Derived<S> {
    fn on_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.watch(move |_| callback())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
