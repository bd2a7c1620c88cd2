// DynTable integration suite: runtime key kinds, typed vs loose entry
// points, key-kind reconfiguration and merges between kinds.
use chain_table::{DynTable, Key, KeyKind, MergeOp, Table, TableError};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn ints(
    pairs: &[(i64, &'static str)],
    dropped: &Rc<RefCell<Vec<&'static str>>>,
) -> DynTable<&'static str> {
    let sink = dropped.clone();
    let table = Table::builder()
        .strategy(chain_table::KindStrategy::new(KeyKind::I32))
        .value_destructor(move |v: &'static str| sink.borrow_mut().push(v))
        .build()
        .unwrap();
    let mut t = DynTable::from_table(table);
    for &(k, v) in pairs {
        t.put_int(k, v).unwrap();
    }
    t
}

fn contents(t: &DynTable<&'static str>) -> BTreeMap<i64, &'static str> {
    t.iter()
        .map(|(k, v)| match k {
            Key::I32(n) => (i64::from(*n), *v),
            other => panic!("unexpected key {other:?}"),
        })
        .collect()
}

// Scenario: A={1:x,2:y}, B={2:y,3:z} with integer keys.
// Verifies: membership of each operator and that B's entries are all
// disposed of or moved.
#[test]
fn integer_merges() {
    let a_pairs = [(1, "x"), (2, "y")];
    let b_pairs = [(2, "y"), (3, "z")];
    let cases = [
        (MergeOp::And, vec![(2, "y")]),
        (MergeOp::Or, vec![(1, "x"), (2, "y"), (3, "z")]),
        (MergeOp::Xor, vec![(1, "x"), (3, "z")]),
        (MergeOp::Not, vec![(1, "x")]),
    ];
    for (op, want) in cases {
        let dropped = Rc::new(RefCell::new(Vec::new()));
        let mut a = ints(&a_pairs, &dropped);
        let b = ints(&b_pairs, &dropped);
        a.merge(b, op).unwrap();
        let want: BTreeMap<i64, &str> = want.into_iter().collect();
        assert_eq!(contents(&a), want, "{op:?}");
        assert_eq!(dropped.borrow().len() + a.len(), 4, "{op:?}");
    }
}

#[test]
fn every_kind_round_trips_its_loose_form() {
    for kind in KeyKind::ALL {
        let mut t: DynTable<u32> = DynTable::new(kind);
        if kind.is_integer() {
            for i in 0..100 {
                assert_eq!(t.put_int(i, i as u32), Ok(None));
            }
            for i in 0..100 {
                assert_eq!(t.fetch_int(i), Ok(Some(&(i as u32))));
            }
            assert!(t.fetch_text("1").is_err());
        } else {
            for i in 0..100u32 {
                assert_eq!(t.put_text(&format!("key{i}"), i), Ok(None));
            }
            for i in 0..100u32 {
                assert_eq!(t.fetch_text(&format!("key{i}")), Ok(Some(&i)));
            }
            assert!(t.fetch_int(1).is_err());
        }
        assert_eq!(t.len(), 100, "{kind}");
    }
}

#[test]
fn caseless_kinds_unify_case_variants() {
    let mut t: DynTable<u8> = DynTable::strings_nocase();
    t.put("Accept", 1).unwrap();
    assert_eq!(t.put("ACCEPT", 2), Ok(Some(1)));
    assert_eq!(t.len(), 1);
    *t.fetch_mut("accept").unwrap().unwrap() += 1;
    assert_eq!(t.fetch("aCCEPT"), Ok(Some(&3)));
    assert_eq!(t.contains_key("accepted"), Ok(false));
}

#[test]
fn reconfiguring_key_kind_rehashes_live_entries() {
    let mut t: DynTable<u8> = DynTable::bytes_nocase();
    t.put_text("Host", 1).unwrap();
    t.put_text("Port", 2).unwrap();
    assert_eq!(t.set_key_kind(KeyKind::Bytes), Ok(0));
    assert_eq!(t.fetch_text("host"), Ok(None));
    assert_eq!(t.fetch_text("Host"), Ok(Some(&1)));
    assert_eq!(
        t.set_key_kind(KeyKind::U64),
        Err(TableError::KeyKindMismatch {
            expected: KeyKind::Bytes,
            found: KeyKind::U64
        })
    );
}

#[test]
fn integer_width_is_enforced() {
    let mut t: DynTable<()> = DynTable::i32();
    assert_eq!(
        t.put_int(i64::from(i32::MAX) + 1, ()),
        Err(TableError::KeyOutOfRange {
            kind: KeyKind::I32,
            value: i64::from(i32::MAX) + 1
        })
    );
    assert_eq!(t.put_int(i64::from(i32::MIN), ()), Ok(None));
    assert_eq!(t.contains_key(i32::MIN), Ok(true));
    assert_eq!(t.contains_int(i64::MIN), Ok(false));
    assert_eq!(t.remove_int(i64::MIN), Ok(None));
    assert!(matches!(
        t.put(5i64, ()),
        Err(TableError::KeyKindMismatch {
            expected: KeyKind::I32,
            found: KeyKind::I64
        })
    ));
}

#[test]
fn errors_render_kind_names() {
    let t: DynTable<()> = DynTable::u64();
    let e = t.fetch_text("x").unwrap_err();
    assert_eq!(
        e.to_string(),
        "key kind mismatch: table holds u64 keys but got a str key"
    );
}
