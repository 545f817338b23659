//! Property-based invariant tests for cells and derived values.
//!
//! 1. A `map` chain is up to date as soon as `set` returns.
//! 2. `combine2` always reflects the latest value of both sources.
//! 3. Re-setting an identical value still notifies every subscriber.
//! 4. A bound cell mirrors its source after every source emission.
//! 5. A list aggregate equals a fold over the current members, whatever
//!    sequence of pushes, removals and member edits produced them.
//! 6. Dropped subscriptions never fire again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use stepgate_reactive::{Derived, Observable, ObservableList, Source};

proptest! {
    #[test]
    fn map_chain_is_current_after_set(values in proptest::collection::vec(any::<i32>(), 1..40)) {
        let cell = Observable::new(0i32);
        let doubled = cell.map(|v| i64::from(*v) * 2);
        let described = doubled.map(|v| format!("={v}"));
        for v in values {
            cell.set(v);
            prop_assert_eq!(doubled.get(), Ok(i64::from(v) * 2));
            prop_assert_eq!(described.get(), Ok(format!("={}", i64::from(v) * 2)));
        }
    }

    #[test]
    fn combine2_sees_latest_values(
        writes in proptest::collection::vec((any::<bool>(), any::<i16>()), 1..40),
    ) {
        let a = Observable::new(0i16);
        let b = Observable::new(0i16);
        let sum = Derived::combine2(&a, &b, |x, y| i32::from(*x) + i32::from(*y));
        let (mut la, mut lb) = (0i16, 0i16);
        for (left, v) in writes {
            if left {
                a.set(v);
                la = v;
            } else {
                b.set(v);
                lb = v;
            }
            prop_assert_eq!(sum.get(), Ok(i32::from(la) + i32::from(lb)));
        }
    }

    #[test]
    fn identical_sets_notify_every_time(value in any::<u8>(), repeats in 1usize..20) {
        let cell = Observable::new(value);
        let hits = Rc::new(Cell::new(0usize));
        let seen = Rc::clone(&hits);
        let _sub = cell.subscribe(move |_| seen.set(seen.get() + 1));
        for _ in 0..repeats {
            cell.set(value);
        }
        // One push on subscribe, then one per set.
        prop_assert_eq!(hits.get(), repeats + 1);
        prop_assert_eq!(cell.version(), repeats as u64);
    }

    #[test]
    fn bound_cell_mirrors_source(
        writes in proptest::collection::vec((any::<bool>(), any::<u16>()), 1..40),
    ) {
        let source = Observable::new(0u16);
        let target = Observable::new(0u16);
        target.bind(&source);
        for (to_source, v) in writes {
            if to_source {
                source.set(v);
                prop_assert_eq!(target.get(), source.get());
            } else {
                // Direct writes win until the source emits again.
                target.set(v);
                prop_assert_eq!(target.get(), Ok(v));
            }
        }
    }

    #[test]
    fn list_aggregate_matches_fold(
        ops in proptest::collection::vec((0u8..4, any::<u8>(), 0usize..8), 0..50),
    ) {
        let list: ObservableList<Observable<u8>> = ObservableList::new();
        let total = list.aggregate(Observable::read_only, |values| {
            values.iter().flatten().map(|v| u32::from(*v)).sum::<u32>()
        });
        for (kind, value, index) in ops {
            match kind {
                0 => list.push(Observable::new(value)),
                1 => {
                    let _ = list.remove(index);
                }
                2 => {
                    if let Some(member) = list.get(index) {
                        member.set(value);
                    }
                }
                _ => list.insert(index, Observable::new(value)),
            }
            let expected: u32 = list
                .to_vec()
                .iter()
                .filter_map(Observable::try_get)
                .map(u32::from)
                .sum();
            prop_assert_eq!(total.get(), Ok(expected));
        }
    }

    #[test]
    fn dropped_subscriptions_stay_silent(
        keep in proptest::collection::vec(any::<bool>(), 1..10),
        value in any::<u8>(),
    ) {
        let cell = Observable::new(0u8);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for (i, _) in keep.iter().enumerate() {
            let log = Rc::clone(&log);
            subs.push(Some(cell.subscribe(move |v| log.borrow_mut().push((i, *v)))));
        }
        for (slot, keep) in subs.iter_mut().zip(&keep) {
            if !keep {
                *slot = None;
            }
        }
        log.borrow_mut().clear();
        cell.set(value);

        let expected: Vec<(usize, u8)> = keep
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| (i, value))
            .collect();
        prop_assert_eq!(log.borrow().clone(), expected);
        prop_assert_eq!(cell.subscriber_count(), keep.iter().filter(|k| **k).count());
    }
}
