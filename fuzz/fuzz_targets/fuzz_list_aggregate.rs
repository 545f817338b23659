#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stepgate::prelude::*;

#[derive(Arbitrary, Debug)]
enum ListOp {
    Push(u8),
    Insert(u8, u8),
    Remove(u8),
    Set(u8, u8),
    Clear,
}

fuzz_target!(|ops: Vec<ListOp>| {
    let list: ObservableList<Observable<u8>> = ObservableList::new();
    let total = list.aggregate(Observable::read_only, |values| {
        values.iter().flatten().map(|v| u32::from(*v)).sum::<u32>()
    });

    for op in ops.iter().take(512) {
        match *op {
            ListOp::Push(v) => list.push(Observable::new(v)),
            ListOp::Insert(i, v) => list.insert(usize::from(i), Observable::new(v)),
            ListOp::Remove(i) => {
                let _ = list.remove(usize::from(i));
            }
            ListOp::Set(i, v) => {
                if let Some(member) = list.get(usize::from(i)) {
                    member.set(v);
                }
            }
            ListOp::Clear => list.clear(),
        }
        let expected: u32 = list
            .to_vec()
            .iter()
            .filter_map(Observable::try_get)
            .map(u32::from)
            .sum();
        assert_eq!(total.get(), Ok(expected));
    }
});
