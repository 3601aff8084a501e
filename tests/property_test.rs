// Copyright 2025 Rowdex Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property Tests
//!
//! Randomized operation sequences checked against std collections, plus
//! structural checks that walk the AVL links directly.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use proptest::prelude::*;
use rowdex::{
    AvlTree, BaseMap, Datum, IndexColumn, IndexConfig, MapConfig, OrderedIndex, Representation,
    RowProvider, ScanDirection, Slot, TransactionRegistry, Value, VersionedRows, NIL,
};

#[derive(Clone, Debug)]
enum MapOp {
    Put(i64, i64),
    Remove(i64),
    Get(i64),
    Clear,
}

fn map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    // Narrow key range so removes and overwrites hit existing keys
    let key = -64i64..256;
    let op = prop_oneof![
        50 => (key.clone(), any::<i64>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        25 => key.clone().prop_map(MapOp::Remove),
        24 => key.prop_map(MapOp::Get),
        1 => Just(MapOp::Clear),
    ];
    prop::collection::vec(op, 0..=1500)
}

#[derive(Clone, Debug)]
enum TreeOp {
    Insert(i64),
    Remove(i64),
}

fn tree_ops() -> impl Strategy<Value = Vec<TreeOp>> {
    let key = 0i64..500;
    let op = prop_oneof![
        3 => key.clone().prop_map(TreeOp::Insert),
        2 => key.prop_map(TreeOp::Remove),
    ];
    prop::collection::vec(op, 0..=1000)
}

/// Height of the subtree at `slot`, checking balance factors and parent
/// links along the way
fn walk_height(tree: &AvlTree<i64>, slot: Slot, parent: Slot) -> usize {
    if slot == NIL {
        return 0;
    }
    let node = tree.node(slot);
    assert_eq!(node.parent, parent, "parent link of node {slot}");
    let left = walk_height(tree, node.left, slot);
    let right = walk_height(tree, node.right, slot);
    let diff = left as i64 - right as i64;
    assert!(diff.abs() <= 1, "node {slot} unbalanced: {left} vs {right}");
    assert_eq!(i64::from(node.balance), diff, "stored balance of node {slot}");
    1 + left.max(right)
}

fn in_order(tree: &AvlTree<i64>) -> Vec<i64> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    let mut current = tree.root();
    while current != NIL || !stack.is_empty() {
        while current != NIL {
            stack.push(current);
            current = tree.node(current).left;
        }
        if let Some(slot) = stack.pop() {
            out.push(*tree.row(slot));
            current = tree.node(slot).right;
        }
    }
    out
}

fn max_avl_height(n: usize) -> usize {
    // Smallest tree of height h has fib(h + 2) - 1 nodes
    let (mut a, mut b) = (1usize, 2usize);
    let mut h = 1;
    while b <= n {
        let next = a + b + 1;
        a = b;
        b = next;
        h += 1;
    }
    h
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_matches_std_hashmap(ops in map_ops(), capacity in 1usize..32) {
        let config = MapConfig::new(Representation::Int64, Representation::Int64)
            .with_initial_capacity(capacity)
            .with_access_tracking(true);
        let mut map: BaseMap<i64, i64> = BaseMap::new(config).expect("map");
        let mut model: HashMap<i64, i64> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    let old = map.put(Datum::Long(k), Datum::Long(v)).expect("put");
                    prop_assert_eq!(old.and_then(|d| d.as_long()), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    let old = map.remove(&Datum::Long(k));
                    prop_assert_eq!(old.and_then(|d| d.as_long()), model.remove(&k));
                }
                MapOp::Get(k) => {
                    let got = map.get(&Datum::Long(k));
                    prop_assert_eq!(got.and_then(|d| d.as_long()), model.get(&k).copied());
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        map.verify().expect("map structure");
        let mut got: Vec<(i64, i64)> = map
            .iter()
            .filter_map(|(k, v)| Some((k.as_long()?, v?.as_long()?)))
            .collect();
        got.sort_unstable();
        let mut expected: Vec<(i64, i64)> = model.into_iter().collect();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
        prop_assert!(map.len() <= map.capacity());
    }

    #[test]
    fn prop_rehash_preserves_entries(keys in prop::collection::btree_set(any::<i64>(), 1..600)) {
        let config = MapConfig::new(Representation::Int64, Representation::Int64)
            .with_initial_capacity(1);
        let mut map: BaseMap<i64, i64> = BaseMap::new(config).expect("map");
        for &k in &keys {
            map.put(Datum::Long(k), Datum::Long(k.wrapping_mul(31))).expect("put");
        }
        prop_assert!(keys.len() < 2 || map.rehash_count() > 0);
        for &k in &keys {
            let got = map.get(&Datum::Long(k)).and_then(|d| d.as_long());
            prop_assert_eq!(got, Some(k.wrapping_mul(31)));
        }
        map.verify().expect("map structure");
    }

    #[test]
    fn prop_avl_stays_balanced_and_ordered(ops in tree_ops()) {
        let mut tree: AvlTree<i64> = AvlTree::new();
        let mut model: BTreeSet<i64> = BTreeSet::new();

        for op in ops {
            match op {
                TreeOp::Insert(k) => {
                    if model.insert(k) {
                        tree.insert(k, |existing| k.cmp(existing)).expect("insert");
                    }
                }
                TreeOp::Remove(k) => {
                    let slot = tree.first_where(|row| *row >= k);
                    let present = slot != NIL && *tree.row(slot) == k;
                    prop_assert_eq!(present, model.remove(&k));
                    if present {
                        prop_assert_eq!(tree.remove(slot), Some(k));
                    }
                }
            }

            let height = walk_height(&tree, tree.root(), NIL);
            prop_assert!(height <= max_avl_height(tree.len()));
            prop_assert_eq!(height, tree.height());
        }

        let expected: Vec<i64> = model.into_iter().collect();
        prop_assert_eq!(in_order(&tree), expected);
    }

    #[test]
    fn prop_filtered_scan_matches_raw_scan(
        fates in prop::collection::vec(0u8..3, 1..40),
        keys in prop::collection::vec(0i64..20, 40),
        deleted in prop::collection::vec(any::<bool>(), 40),
    ) {
        let registry = Arc::new(TransactionRegistry::new());
        let rows = Arc::new(VersionedRows::new(Arc::clone(&registry)));
        let index = OrderedIndex::new(
            IndexConfig::new("idx").with_column(IndexColumn::ascending(0)),
            Arc::clone(&rows),
        )
        .expect("index");

        let (reader, _) = registry.begin().expect("begin");
        let (janitor, _) = registry.begin().expect("begin");
        for (i, fate) in fates.iter().enumerate() {
            let (txn, _) = registry.begin().expect("begin");
            let r = rows
                .insert(txn, i as i64, vec![Value::integer(keys[i])])
                .expect("insert");
            index.insert(r).expect("index insert");
            if deleted[i] {
                rows.delete(janitor, r).expect("delete");
            }
            // 0 stays active, 1 commits, 2 aborts
            match *fate {
                1 => { registry.commit(txn).expect("commit"); }
                2 => registry.abort(txn).expect("abort"),
                _ => {}
            }
        }
        registry.commit(janitor).expect("commit");

        let ctx = registry.context(reader, 1).expect("context");
        for direction in [ScanDirection::Forward, ScanDirection::Backward] {
            let expected: Vec<_> = index
                .raw_scan(direction)
                .filter(|r| rows.is_visible(r, &ctx))
                .collect();
            let mut scan = index.scan(&ctx, direction);
            let got: Vec<_> = scan.by_ref().collect();
            prop_assert_eq!(scan.skipped(), index.len() - got.len());
            prop_assert_eq!(got, expected);
        }
    }
}
