#![forbid(unsafe_code)]

//! Ordered collections whose aggregates track membership changes.
//!
//! [`ObservableList<T>`] is a shared, mutable `Vec<T>` paired with a revision
//! cell that bumps on every structural change. [`ObservableList::aggregate`]
//! projects each item to a [`Derived`] value and folds all of them into one
//! derived result that stays correct as items are added or removed.
//!
//! # Invariants
//!
//! 1. Each `push`/`insert`/`remove`/`clear` bumps the revision exactly once,
//!    after the items have been updated.
//! 2. On a revision change an aggregate releases every per-item subscription
//!    before subscribing to the current members.
//! 3. An aggregate recomputes once per rebuild and once per member emission,
//!    never in the middle of a rebuild.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::derived::Derived;
use crate::logging::debug;
use crate::observable::{self, Node, NodeRef, Observable, Subscription};

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    revision: Observable<u64>,
}

/// A shared, observable, ordered list.
///
/// Cloning an `ObservableList` creates a new handle to the **same** list.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.inner.items.borrow())
            .field("revision", &self.inner.revision.version())
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(iter.into_iter().collect()),
                revision: Observable::new(0),
            }),
        }
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    #[must_use]
    pub fn new() -> Self {
        std::iter::empty::<T>().collect()
    }

    pub fn push(&self, item: T) {
        self.inner.items.borrow_mut().push(item);
        self.bump();
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: T) {
        {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item);
        }
        self.bump();
    }

    /// Remove and return the item at `index`. Out-of-range is a no-op.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub fn clear(&self) {
        self.inner.items.borrow_mut().clear();
        self.bump();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Structural change counter; emits after every mutation.
    #[must_use]
    pub fn revision(&self) -> Derived<u64> {
        self.inner.revision.read_only()
    }

    fn bump(&self) {
        let next = self.inner.revision.try_get().unwrap_or_default() + 1;
        self.inner.revision.set(next);
    }

    /// Fold the projections of all current items into one derived value.
    ///
    /// `fold` receives one entry per item, in list order; an entry is `None`
    /// while that item's projection has no value, including after it drops
    /// back to uninitialized. With no items, `fold`
    /// receives an empty slice.
    pub fn aggregate<V, R>(
        &self,
        project: impl Fn(&T) -> Derived<V> + 'static,
        fold: impl Fn(&[Option<V>]) -> R + 'static,
    ) -> Derived<R>
    where
        V: Clone + 'static,
        R: Clone + 'static,
    {
        let out: NodeRef<R> = Node::new(None);
        let state = Rc::new(AggregateState::<V> {
            rebuilding: Cell::new(false),
            members: RefCell::new(Vec::new()),
            subs: RefCell::new(Vec::new()),
        });

        let recompute: Rc<dyn Fn()> = {
            let target = Rc::downgrade(&out);
            let state = Rc::downgrade(&state);
            Rc::new(move || {
                let (Some(node), Some(state)) = (target.upgrade(), state.upgrade()) else {
                    return;
                };
                if state.rebuilding.get() {
                    return;
                }
                let values: Vec<Option<V>> =
                    state.members.borrow().iter().map(Derived::try_get).collect();
                observable::publish(&node, fold(&values));
            })
        };

        let list = Rc::downgrade(&self.inner);
        let weak_state = Rc::downgrade(&state);
        let rebuild = self.inner.revision.subscribe(move |_| {
            let (Some(list), Some(state)) = (list.upgrade(), weak_state.upgrade()) else {
                return;
            };
            state.rebuilding.set(true);

            let stale = state.subs.take();
            drop(stale);
            let items = list.items.borrow().clone();
            let members: Vec<Derived<V>> = items.iter().map(&project).collect();
            let subs: Vec<Subscription> = members
                .iter()
                .map(|member| {
                    let recompute = Rc::clone(&recompute);
                    member.watch(move |_| recompute())
                })
                .collect();
            debug!(message = "list.rebuild", members = members.len());
            state.members.replace(members);
            state.subs.replace(subs);

            state.rebuilding.set(false);
            recompute();
        });

        observable::retain(&out, self.clone());
        observable::retain(&out, state);
        observable::retain(&out, rebuild);
        Derived::from_node(out)
    }
}

struct AggregateState<V> {
    rebuilding: Cell<bool>,
    members: RefCell<Vec<Derived<V>>>,
    subs: RefCell<Vec<Subscription>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::Source;

    fn all_true(list: &ObservableList<Observable<bool>>) -> Derived<bool> {
        list.aggregate(Observable::read_only, |values| {
            values.iter().all(|v| *v == Some(true))
        })
    }

    #[test]
    fn empty_list_aggregate_is_vacuous() {
        let list: ObservableList<Observable<bool>> = ObservableList::new();
        let all = all_true(&list);
        assert_eq!(all.get(), Ok(true));
    }

    #[test]
    fn push_invalid_member_flips_aggregate() {
        let list = ObservableList::new();
        list.push(Observable::new(true));
        let all = all_true(&list);
        assert_eq!(all.get(), Ok(true));

        list.push(Observable::new(false));
        assert_eq!(all.get(), Ok(false));
    }

    #[test]
    fn member_change_recomputes() {
        let a = Observable::new(true);
        let b = Observable::new(true);
        let list: ObservableList<_> = [a.clone(), b.clone()].into_iter().collect();
        let all = all_true(&list);
        b.set(false);
        assert_eq!(all.get(), Ok(false));
        b.set(true);
        assert_eq!(all.get(), Ok(true));
    }

    #[test]
    fn uninitialized_member_is_passed_as_none() {
        let list = ObservableList::new();
        let pending: Observable<bool> = Observable::uninit();
        list.push(pending.clone());
        let count = list.aggregate(Observable::read_only, |values| {
            values.iter().filter(|v| v.is_none()).count()
        });
        assert_eq!(count.get(), Ok(1));
        pending.set(true);
        assert_eq!(count.get(), Ok(0));
    }

    #[test]
    fn member_dropping_back_to_uninit_is_seen() {
        let which = Observable::new(true);
        let pending: Observable<bool> = Observable::uninit();
        let fallback = pending.read_only();
        let member = which.select(move |ready| {
            if *ready {
                Derived::constant(true)
            } else {
                fallback.clone()
            }
        });
        let list = ObservableList::new();
        list.push(member);
        let all = list.aggregate(Derived::clone, |values| {
            values.iter().all(|v| *v == Some(true))
        });
        assert_eq!(all.get(), Ok(true));

        which.set(false);
        assert_eq!(all.get(), Ok(false));
        pending.set(true);
        assert_eq!(all.get(), Ok(true));
    }

    #[test]
    fn removal_recomputes_against_current_members() {
        let bad = Observable::new(false);
        let list: ObservableList<_> = [Observable::new(true), bad.clone()].into_iter().collect();
        let all = all_true(&list);
        assert_eq!(all.get(), Ok(false));

        assert!(list.remove(1).is_some());
        assert_eq!(all.get(), Ok(true));
        // The removed member no longer drives the aggregate.
        assert_eq!(bad.subscriber_count(), 0);
        bad.set(false);
        assert_eq!(all.get(), Ok(true));
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let list: ObservableList<u8> = ObservableList::new();
        let revision = list.revision();
        assert_eq!(list.remove(3), None);
        assert_eq!(revision.get(), Ok(0));
    }

    #[test]
    fn rebuild_recomputes_once() {
        let calls = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&calls);
        let list: ObservableList<_> = (0..3).map(|_| Observable::new(true)).collect();
        let _all = list.aggregate(Observable::read_only, move |values| {
            seen.set(seen.get() + 1);
            values.len()
        });
        assert_eq!(calls.get(), 1);
        list.push(Observable::new(true));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn insert_and_clear() {
        let list: ObservableList<i32> = [1, 3].into_iter().collect();
        list.insert(1, 2);
        list.insert(99, 4);
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        let sum = list.aggregate(|v| Derived::constant(*v), |values| {
            values.iter().flatten().sum::<i32>()
        });
        assert_eq!(sum.get(), Ok(10));
        list.clear();
        assert!(list.is_empty());
        assert_eq!(sum.get(), Ok(0));
        assert_eq!(list.revision().get(), Ok(3));
    }

    #[test]
    fn aggregate_of_mapped_projection() {
        let field = Observable::new(String::new());
        let list = ObservableList::new();
        list.push(field.clone());
        let non_empty = list.aggregate(
            |f: &Observable<String>| f.map(|s| !s.is_empty()),
            |values| values.iter().all(|v| *v == Some(true)),
        );
        assert_eq!(non_empty.get(), Ok(false));
        field.set("x".into());
        assert_eq!(non_empty.get(), Ok(true));
    }
}
