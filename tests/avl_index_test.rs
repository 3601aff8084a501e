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

//! Ordered Index Tests
//!
//! Public-API tests for OrderedIndex over always-visible rows: ordering,
//! balance, relational search, duplicate handling and unique constraints.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use rowdex::{
    CommittedRows, CompareType, IndexColumn, IndexConfig, KeyedRow, NullsOrder, OrderedIndex,
    ScanDirection, Value, VisibilityContext,
};

fn ascending_index(name: &str) -> OrderedIndex<CommittedRows> {
    OrderedIndex::new(
        IndexConfig::new(name).with_column(IndexColumn::ascending(0)),
        Arc::new(CommittedRows::new()),
    )
    .expect("Failed to create index")
}

fn row(id: i64, key: i64) -> KeyedRow {
    KeyedRow::new(id, vec![Value::integer(key)])
}

fn key_of(row: &KeyedRow) -> i64 {
    row.values[0].as_int64().expect("integer key")
}

fn ctx() -> VisibilityContext {
    VisibilityContext::default()
}

#[test]
fn test_seven_key_insert_order() {
    let index = ascending_index("seven");
    for (id, key) in [5, 3, 8, 1, 4, 7, 9].into_iter().enumerate() {
        index.insert(row(id as i64, key)).expect("Insert failed");
    }

    assert_eq!(index.first_row(&ctx()).map(|r| key_of(&r)), Some(1));
    assert_eq!(index.last_row(&ctx()).map(|r| key_of(&r)), Some(9));

    let in_order: Vec<i64> = index
        .scan(&ctx(), ScanDirection::Forward)
        .map(|r| key_of(&r))
        .collect();
    assert_eq!(in_order, vec![1, 3, 4, 5, 7, 8, 9]);

    // ceil(log2(8)) = 3
    let stats = index.verify().expect("Tree invalid");
    assert_eq!(stats.len, 7);
    assert!(stats.height <= 3, "height {}", stats.height);
}

#[test]
fn test_eq_on_duplicates_is_repeatable() {
    let index = ascending_index("dups");
    for (id, key) in [(10, 3), (20, 5), (30, 5), (40, 7)] {
        index.insert(row(id, key)).expect("Insert failed");
    }

    let key = [Value::integer(5)];
    let first = index
        .find(&ctx(), &key, 1, CompareType::Eq)
        .expect("key 5 present");
    assert_eq!(key_of(&first), 5);
    for _ in 0..20 {
        let again = index
            .find(&ctx(), &key, 1, CompareType::Eq)
            .expect("key 5 present");
        assert_eq!(again.row_id, first.row_id);
    }
}

#[test]
fn test_empty_index_queries() {
    let index = ascending_index("empty");
    let key = [Value::integer(1)];
    assert!(index.first_row(&ctx()).is_none());
    assert!(index.last_row(&ctx()).is_none());
    for op in [
        CompareType::Eq,
        CompareType::Ge,
        CompareType::Gt,
        CompareType::Le,
        CompareType::Lt,
    ] {
        assert!(index.find(&ctx(), &key, 1, op).is_none());
    }
    assert!(!index.delete(&row(1, 1)));
    assert_eq!(index.verify().expect("Tree invalid").height, 0);
}

#[test]
fn test_random_inserts_and_deletes_stay_balanced() {
    let index = ascending_index("random");
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<i64> = (0..2000).collect();
    keys.shuffle(&mut rng);

    for &k in &keys {
        index.insert(row(k, k % 97)).expect("Insert failed");
    }
    index.verify().expect("Tree invalid after inserts");

    keys.shuffle(&mut rng);
    for (n, &k) in keys.iter().enumerate() {
        if n % 2 == 0 {
            assert!(index.delete(&row(k, k % 97)), "delete {}", k);
        }
        if n % 100 == 0 {
            index.verify().expect("Tree invalid during deletes");
        }
    }

    let stats = index.verify().expect("Tree invalid after deletes");
    assert_eq!(stats.len, 1000);
    // AVL bound: 1.44 * log2(1002) < 15
    assert!(stats.height < 15);

    let scanned: Vec<(i64, i64)> = index
        .scan(&ctx(), ScanDirection::Forward)
        .map(|r| (key_of(&r), r.row_id))
        .collect();
    let mut sorted = scanned.clone();
    sorted.sort();
    assert_eq!(scanned, sorted, "scan must follow key then row id order");
}

#[test]
fn test_range_scans() {
    let index = ascending_index("range");
    for k in 0..20 {
        index.insert(row(k, k * 10)).expect("Insert failed");
    }

    let collect = |key: i64, op: CompareType| -> Vec<i64> {
        index
            .find_iter(&ctx(), &[Value::integer(key)], 1, op)
            .map(|r| key_of(&r))
            .take(3)
            .collect()
    };

    assert_eq!(collect(55, CompareType::Ge), vec![60, 70, 80]);
    assert_eq!(collect(60, CompareType::Ge), vec![60, 70, 80]);
    assert_eq!(collect(60, CompareType::Gt), vec![70, 80, 90]);
    assert_eq!(collect(60, CompareType::Le), vec![60, 50, 40]);
    assert_eq!(collect(60, CompareType::Lt), vec![50, 40, 30]);
    assert_eq!(collect(60, CompareType::Eq), vec![60]);
    assert_eq!(collect(-5, CompareType::Lt), Vec::<i64>::new());
    assert_eq!(collect(500, CompareType::Gt), Vec::<i64>::new());
}

#[test]
fn test_unique_index_rejects_duplicate_key() {
    let index = OrderedIndex::new(
        IndexConfig::new("uq_email")
            .with_column(IndexColumn::ascending(1))
            .unique(),
        Arc::new(CommittedRows::with_columns(2)),
    )
    .expect("Failed to create index");

    let user = |id: i64, email: &str| {
        KeyedRow::new(id, vec![Value::integer(id), Value::text(email)])
    };
    index.insert(user(1, "a@x")).expect("Insert failed");
    index.insert(user(2, "b@x")).expect("Insert failed");

    let err = index.insert(user(3, "a@x")).expect_err("duplicate key");
    assert!(err.is_constraint_violation());
    assert_eq!(index.len(), 2);

    // The key becomes available after the holder is deleted
    assert!(index.delete(&user(1, "a@x")));
    index.insert(user(3, "a@x")).expect("Insert after delete failed");
}

#[test]
fn test_mixed_direction_and_nulls() {
    let index = OrderedIndex::new(
        IndexConfig::new("dept_salary")
            .with_column(IndexColumn::ascending(0).with_nulls(NullsOrder::Last))
            .with_column(IndexColumn::descending(1)),
        Arc::new(CommittedRows::new()),
    )
    .expect("Failed to create index");

    let emp = |id: i64, dept: Value, salary: i64| {
        KeyedRow::new(id, vec![dept, Value::integer(salary)])
    };
    index.insert(emp(1, Value::text("eng"), 100)).expect("Insert failed");
    index.insert(emp(2, Value::Null, 500)).expect("Insert failed");
    index.insert(emp(3, Value::text("eng"), 300)).expect("Insert failed");
    index.insert(emp(4, Value::text("art"), 200)).expect("Insert failed");

    let order: Vec<i64> = index
        .scan(&ctx(), ScanDirection::Forward)
        .map(|r| r.row_id)
        .collect();
    assert_eq!(order, vec![4, 3, 1, 2]);

    let top_eng = index
        .find(&ctx(), &[Value::text("eng")], 1, CompareType::Eq)
        .expect("eng present");
    assert_eq!(top_eng.row_id, 3);
}

#[test]
fn test_resume_across_inserts() {
    let index = ascending_index("resume");
    for k in (0..50).step_by(2) {
        index.insert(row(k, k)).expect("Insert failed");
    }

    let mut seen = Vec::new();
    let mut cursor = {
        let mut scan = index.scan(&ctx(), ScanDirection::Forward);
        seen.extend(scan.by_ref().take(5).map(|r| key_of(&r)));
        scan.cursor()
    };

    // Odd keys appear on both sides of the cursor
    for k in (1..50).step_by(2) {
        index.insert(row(k, k)).expect("Insert failed");
    }

    loop {
        let mut scan = index.resume(&ctx(), &cursor);
        let batch: Vec<i64> = scan.by_ref().take(10).map(|r| key_of(&r)).collect();
        if batch.is_empty() {
            break;
        }
        seen.extend(batch);
        cursor = scan.cursor();
    }

    assert_eq!(&seen[..5], &[0, 2, 4, 6, 8]);
    let expected_tail: Vec<i64> = (9..50).collect();
    assert_eq!(&seen[5..], expected_tail.as_slice());
}
