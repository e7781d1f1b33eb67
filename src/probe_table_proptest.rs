#![cfg(test)]

// Property tests for ProbeTable kept inside the crate so they can inspect
// capacity transitions alongside the public operations.

use crate::config::TableConfig;
use crate::probe_table::ProbeTable;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Get(usize),
    GetMut(usize, i32),
    Iterate,
}

// Keys are drawn from a few residue classes so that probe chains, window
// overflow and wraparound all occur at small capacities.
fn arb_scenario() -> impl Strategy<Value = (usize, Vec<u64>, Vec<OpI>)> {
    let pool = proptest::collection::vec((0u64..4, 0u64..64), 1..=24)
        .prop_map(|raw| raw.into_iter().map(|(hi, lo)| hi * 1024 + lo).collect::<Vec<_>>());
    (1usize..=16, pool).prop_flat_map(|(cap, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::GetMut(i, d)),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (cap, pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap for
// insert-only workloads.
// Invariants exercised across random operation sequences:
// - insert returns the replaced value exactly when the model had one.
// - get/get_mut agree with the model for every key in the pool.
// - len equals the model's size and never exceeds capacity / 2.
// - capacity only changes by doubling.
// - iteration and for_each yield each live entry exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((cap, pool, ops) in arb_scenario()) {
        let mut sut: ProbeTable<u64, i32> = ProbeTable::with_capacity(cap).unwrap();
        let mut model: HashMap<u64, i32> = HashMap::new();

        for op in ops {
            let before = sut.capacity();
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i];
                    let prev = sut.insert(k, v).expect("unbounded table never fails");
                    prop_assert_eq!(prev, model.insert(k, v));
                }
                OpI::Get(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.get(k), model.get(&k));
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(&k));
                }
                OpI::GetMut(i, d) => {
                    let k = pool[i];
                    match (sut.get_mut(k), model.get_mut(&k)) {
                        (Some(a), Some(b)) => {
                            *a = a.wrapping_add(d);
                            *b = b.wrapping_add(d);
                        }
                        (None, None) => {}
                        (a, b) => prop_assert!(false, "get_mut parity: {:?} vs {:?}", a, b),
                    }
                }
                OpI::Iterate => {
                    let seen: BTreeMap<u64, i32> = sut.iter().map(|(k, v)| (k, *v)).collect();
                    let expected: BTreeMap<u64, i32> = model.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(sut.iter().count(), model.len());
                    prop_assert_eq!(seen, expected);

                    let mut visited = 0usize;
                    let flow: ControlFlow<()> = sut.for_each(|_, _| {
                        visited += 1;
                        ControlFlow::Continue(())
                    });
                    prop_assert_eq!(flow, ControlFlow::Continue(()));
                    prop_assert_eq!(visited, model.len());
                }
            }

            let after = sut.capacity();
            prop_assert!(after == before || (after % before == 0 && (after / before).is_power_of_two()));
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.len() <= sut.capacity() / 2);
        }

        for (k, v) in &model {
            prop_assert_eq!(sut.get(*k), Some(v));
        }
    }
}

// Property: a key inserted with no later removal stays reachable through any
// number of growths, whatever the probe bound.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_inserted_keys_survive_growth(
        keys in proptest::collection::btree_set(0u32..1_000_000, 1..200),
        cap in 1usize..=32,
        max_probe in 2usize..=8,
    ) {
        let config = TableConfig::new(cap).with_max_probe(max_probe);
        let mut t: ProbeTable<u32, u32> = ProbeTable::with_config(config).unwrap();
        for &k in &keys {
            prop_assert_eq!(t.insert(k, k ^ 0x5a5a).unwrap(), None);
        }
        prop_assert_eq!(t.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(t.get(k), Some(&(k ^ 0x5a5a)));
        }
    }
}
