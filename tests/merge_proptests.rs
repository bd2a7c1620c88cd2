use chain_table::{KeyStrategy, MergeOp, Table, WithHasher};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

type Values = Rc<Cell<usize>>;

fn build<H: KeyStrategy<u16>>(
    strategy: H,
    pairs: &[(u16, u32)],
    destroyed: &Values,
) -> Table<u16, u32, H> {
    let d = destroyed.clone();
    let mut t = Table::builder()
        .strategy(strategy)
        .expected_len(pairs.len())
        .value_destructor(move |_v: u32| d.set(d.get() + 1))
        .build()
        .unwrap();
    for &(k, v) in pairs {
        t.put(k, v);
    }
    t
}

fn expected(op: MergeOp, a: &BTreeMap<u16, u32>, b: &BTreeMap<u16, u32>) -> BTreeMap<u16, u32> {
    let mut out = BTreeMap::new();
    for (&k, &v) in a {
        let keep = match op {
            MergeOp::And => b.contains_key(&k),
            MergeOp::Or => true,
            MergeOp::Xor | MergeOp::Not => !b.contains_key(&k),
        };
        if keep {
            out.insert(k, v);
        }
    }
    if matches!(op, MergeOp::Or | MergeOp::Xor) {
        for (&k, &v) in b {
            if !a.contains_key(&k) {
                out.insert(k, v);
            }
        }
    }
    out
}

fn arb_op() -> impl Strategy<Value = MergeOp> {
    prop_oneof![
        Just(MergeOp::And),
        Just(MergeOp::Or),
        Just(MergeOp::Xor),
        Just(MergeOp::Not),
    ]
}

fn arb_side() -> impl Strategy<Value = BTreeMap<u16, u32>> {
    proptest::collection::btree_map(0u16..400, any::<u32>(), 0..300)
}

fn check<H: KeyStrategy<u16>>(
    sa: H,
    sb: H,
    op: MergeOp,
    a: &BTreeMap<u16, u32>,
    b: &BTreeMap<u16, u32>,
) -> Result<(), TestCaseError> {
    let destroyed = Rc::new(Cell::new(0));
    let pa: Vec<_> = a.iter().map(|(&k, &v)| (k, v)).collect();
    let pb: Vec<_> = b.iter().map(|(&k, &v)| (k, v)).collect();
    let mut ta = build(sa, &pa, &destroyed);
    let tb = build(sb, &pb, &destroyed);
    let m = ta.mutation_count();

    ta.merge(tb, op);

    let got: BTreeMap<u16, u32> = ta.iter().map(|(k, v)| (*k, *v)).collect();
    let want = expected(op, a, b);
    prop_assert_eq!(ta.len(), want.len());
    prop_assert_eq!(&got, &want);
    prop_assert!(ta.mutation_count() > m);
    // Every input value either survives or is destroyed exactly once.
    prop_assert_eq!(destroyed.get() + ta.len(), a.len() + b.len());
    // Chains stay short enough for the growth trigger.
    prop_assert!(ta.len() / 8 < ta.size() || ta.size() == chain_table::MAX_SIZE);
    for k in want.keys() {
        prop_assert!(ta.contains_key(k));
    }
    Ok(())
}

proptest! {
    // Aligned path: both tables use the deterministic default strategy.
    #[test]
    fn prop_merge_laws_aligned(op in arb_op(), a in arb_side(), b in arb_side()) {
        check(chain_table::Exact, chain_table::Exact, op, &a, &b)?;
    }

    // Fallback path: per-table hasher state never shares a layout.
    #[test]
    fn prop_merge_laws_cross(op in arb_op(), a in arb_side(), b in arb_side()) {
        check(<WithHasher>::default(), <WithHasher>::default(), op, &a, &b)?;
    }

    // Set identities across chained merges: (A and B) or (A not B) == A.
    #[test]
    fn prop_and_or_not_recomposes(a in arb_side(), b in arb_side()) {
        let destroyed = Rc::new(Cell::new(0));
        let pa: Vec<_> = a.iter().map(|(&k, &v)| (k, v)).collect();
        let pb: Vec<_> = b.iter().map(|(&k, &v)| (k, v)).collect();

        let mut both = build(chain_table::Exact, &pa, &destroyed);
        both.and(build(chain_table::Exact, &pb, &destroyed));
        let mut only_a = build(chain_table::Exact, &pa, &destroyed);
        only_a.not(build(chain_table::Exact, &pb, &destroyed));
        both.or(only_a);

        let keys: BTreeSet<u16> = both.keys().copied().collect();
        let want: BTreeSet<u16> = a.keys().copied().collect();
        prop_assert_eq!(keys, want);
        for (k, v) in &a {
            prop_assert_eq!(both.fetch(k), Some(v));
        }
    }
}
