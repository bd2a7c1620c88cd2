#![cfg(test)]

// Property tests for Table kept inside the crate so they can check the
// internal chain invariants after every step.

use crate::pool::PoolConfig;
use crate::strategy::WithHasher;
use crate::table::Table;
use crate::KeyStrategy;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

const POOL_MAX: usize = 8;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    PutClean(usize, i32),
    Remove(usize),
    RemoveEntry(usize),
    Fetch(usize),
    Contains(String),
    Mutate(usize, i32),
    Resize(usize),
    Clear(bool),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::PutClean(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveEntry),
            2 => idx.clone().prop_map(OpI::Fetch),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..200).prop_map(OpI::Resize),
            1 => any::<bool>().prop_map(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drive `sut` and a std HashMap through the same operations.
// Invariants exercised across random operation sequences:
// - `put` returns the model's previous value; `put_clean` reports presence.
// - `fetch`/`contains_key` parity, including borrowed `&str` lookups.
// - `remove`/`remove_entry` hand back the model's value.
// - Resizing and clearing preserve, respectively drop, exactly the model's content.
// - Every binding sits in its hash's bucket and `len` matches the chains.
// - Pooled shells never exceed the pool's cap; the value destructor runs
//   exactly once per discarded value.
fn run_state_machine<H: KeyStrategy<Key> + KeyStrategy<str>>(
    strategy: H,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let destroyed = Rc::new(Cell::new(0usize));
    let counter = destroyed.clone();
    let mut sut: Table<Key, i32, H> = Table::builder()
        .strategy(strategy)
        .pool_config(PoolConfig::new(2, POOL_MAX))
        .value_destructor(move |_v: i32| counter.set(counter.get() + 1))
        .build()
        .expect("empty table fits");
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut expected_destroyed = 0usize;

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.put(k.clone(), v), model.insert(k, v));
            }
            OpI::PutClean(i, v) => {
                let k = key_from(&pool, i);
                let existed = model.insert(k.clone(), v).is_some();
                prop_assert_eq!(sut.put_clean(k, v), existed);
                if existed {
                    expected_destroyed += 1;
                }
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            OpI::RemoveEntry(i) => {
                let k = key_from(&pool, i);
                let got = sut.remove_entry(k.0.as_str());
                let want = model.remove_entry(&k);
                prop_assert_eq!(got, want);
            }
            OpI::Fetch(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.fetch(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.fetch_mut(&k) {
                    *v = v.saturating_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
            }
            OpI::Resize(hint) => {
                let m = sut.mutation_count();
                let before = sut.size();
                sut.resize(hint).expect("small hints always have a covering prime");
                prop_assert!(sut.size() > hint);
                if sut.size() != before {
                    prop_assert!(sut.mutation_count() > m);
                }
            }
            OpI::Clear(destroy) => {
                if destroy {
                    expected_destroyed += model.len();
                }
                model.clear();
                sut.clear(destroy);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.pool_stats().pooled <= POOL_MAX);
        prop_assert_eq!(destroyed.get(), expected_destroyed);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(crate::Exact, pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Same state machine with every key in one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(WithHasher(ConstBuildHasher), pool, ops)?;
    }
}
