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

//! Ordered index over row handles
//!
//! `OrderedIndex` keeps an [`AvlTree`] of row handles sorted by a
//! [`Comparator`], with ties broken by row identity so that every row has
//! exactly one position. All traversal goes through the visibility filter.
//!
//! One `parking_lot::RwLock` guards the tree: searches and scans share it,
//! inserts and deletes take it exclusively for a single operation.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use smallvec::SmallVec;
use tracing::debug;

use crate::core::{CompareType, Error, Result, ScanDirection, Value};
use crate::storage::arena::{Slot, NIL};
use crate::storage::config::IndexConfig;
use crate::storage::mvcc::VisibilityContext;
use crate::storage::traits::RowProvider;

use super::avl::{AvlTree, TreeStats};
use super::comparator::{Comparator, IndexColumn};
use super::scan::{IndexScan, RawScan, ScanBound, ScanCursor};

/// Descriptive facts about an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    name: String,
    persistence_id: i64,
    columns: SmallVec<[IndexColumn; 4]>,
    unique: bool,
    primary_key: bool,
    constraint: bool,
    forward: bool,
}

impl IndexMetadata {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            name: config.name.clone(),
            persistence_id: config.persistence_id,
            columns: config.columns.clone(),
            unique: config.unique || config.primary_key,
            primary_key: config.primary_key,
            constraint: config.constraint,
            forward: config.forward,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persistence_id(&self) -> i64 {
        self.persistence_id
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Key column positions in significance order
    pub fn column_positions(&self) -> SmallVec<[usize; 4]> {
        self.columns.iter().map(|c| c.position).collect()
    }

    /// Per-column descending flags
    pub fn descending(&self) -> SmallVec<[bool; 4]> {
        self.columns.iter().map(IndexColumn::is_descending).collect()
    }

    /// Per-column nulls-last flags
    pub fn nulls_last(&self) -> SmallVec<[bool; 4]> {
        self.columns.iter().map(IndexColumn::is_nulls_last).collect()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_constraint(&self) -> bool {
        self.constraint
    }

    /// Whether the index backs a foreign key to a table declared later
    pub fn is_forward(&self) -> bool {
        self.forward
    }
}

/// AVL-ordered index over rows supplied by a [`RowProvider`]
pub struct OrderedIndex<P: RowProvider> {
    metadata: IndexMetadata,
    comparator: Comparator,
    provider: Arc<P>,
    tree: RwLock<AvlTree<P::Row>>,
}

impl<P: RowProvider> OrderedIndex<P> {
    /// Create an empty index
    ///
    /// Fails with `InvalidConfig` for an unusable column list and
    /// `ColumnOutOfRange` when the provider reports fewer columns than a key
    /// column needs.
    pub fn new(config: IndexConfig, provider: Arc<P>) -> Result<Self> {
        config.validate()?;
        if let Some(count) = provider.column_count() {
            if let Some(column) = config.columns.iter().find(|c| c.position >= count) {
                return Err(Error::ColumnOutOfRange {
                    index: config.name.clone(),
                    position: column.position,
                });
            }
        }
        Ok(Self {
            metadata: IndexMetadata::from_config(&config),
            comparator: Comparator::new(config.columns.iter().copied()),
            provider,
            tree: RwLock::new(AvlTree::new()),
        })
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.read().is_empty()
    }

    pub fn height(&self) -> usize {
        self.tree.read().height()
    }

    /// Total order used for node placement: key columns, then row identity,
    /// then version identity
    #[inline]
    fn order(&self, a: &P::Row, b: &P::Row) -> Ordering {
        let provider = self.provider.as_ref();
        self.comparator
            .compare_rows(provider, a, b)
            .then_with(|| provider.row_id(a).cmp(&provider.row_id(b)))
            .then_with(|| provider.version_id(a).cmp(&provider.version_id(b)))
    }

    fn key_string(&self, row: &P::Row) -> String {
        let values = self.comparator.project_key(self.provider.as_ref(), row);
        let parts: Vec<String> = values.iter().map(Value::to_string).collect();
        format!("({})", parts.join(", "))
    }

    /// Add `row` to the index
    ///
    /// Returns `Ok(false)` if this exact row is already indexed. A unique
    /// index rejects a row whose key equals any indexed row's key unless a
    /// key column is NULL. The check and the insert share one lock hold.
    pub fn insert(&self, row: P::Row) -> Result<bool> {
        self.insert_checked(row, None)
    }

    /// Add `row` on behalf of the writer described by `ctx`
    ///
    /// Like [`insert`](Self::insert), except that a unique index only counts
    /// equal-key rows that are still live for `ctx`
    /// ([`RowProvider::is_live_for`]). A transaction can therefore delete a
    /// row and insert a new one with the same key.
    pub fn insert_in(&self, ctx: &VisibilityContext, row: P::Row) -> Result<bool> {
        self.insert_checked(row, Some(ctx))
    }

    fn insert_checked(&self, row: P::Row, ctx: Option<&VisibilityContext>) -> Result<bool> {
        let provider = self.provider.as_ref();
        let mut tree = self.tree.write();
        let point = tree.insert_point(|existing| self.order(&row, existing));

        if point.predecessor != NIL
            && self.order(tree.row(point.predecessor), &row) == Ordering::Equal
        {
            return Ok(false);
        }

        if self.metadata.is_unique() && !self.comparator.has_null_key(provider, &row) {
            // Equal keys are contiguous; walk the whole run
            let mut slot = tree.first_where(|existing| {
                self.comparator.compare_rows(provider, existing, &row) != Ordering::Less
            });
            while slot != NIL
                && self.comparator.compare_rows(provider, tree.row(slot), &row) == Ordering::Equal
            {
                let live = ctx.map_or(true, |ctx| provider.is_live_for(tree.row(slot), ctx));
                if live {
                    let key = self.key_string(&row);
                    debug!(
                        index = %self.metadata.name(),
                        key = %key,
                        "unique constraint rejected insert"
                    );
                    return Err(Error::unique_constraint(self.metadata.name(), key));
                }
                slot = tree.next(slot);
            }
        }

        tree.attach(point, row)?;
        Ok(true)
    }

    /// Remove `row` from the index; false if it was not indexed
    pub fn delete(&self, row: &P::Row) -> bool {
        let mut tree = self.tree.write();
        let slot = tree.first_where(|existing| self.order(existing, row) != Ordering::Less);
        if slot == NIL || self.order(tree.row(slot), row) != Ordering::Equal {
            return false;
        }
        tree.remove(slot).is_some()
    }

    /// Returns true if this exact row is indexed
    pub fn contains(&self, row: &P::Row) -> bool {
        let tree = self.tree.read();
        let slot = tree.first_where(|existing| self.order(existing, row) != Ordering::Less);
        slot != NIL && self.order(tree.row(slot), row) == Ordering::Equal
    }

    /// Drop every row
    pub fn clear(&self) {
        self.tree.write().clear();
    }

    /// First visible row satisfying `compare` against the first
    /// `match_columns` key columns
    ///
    /// EQ returns the first visible equal row in index order, so repeated
    /// calls without mutation return the same row.
    pub fn find(
        &self,
        ctx: &VisibilityContext,
        key: &[Value],
        match_columns: usize,
        compare: CompareType,
    ) -> Option<P::Row> {
        self.find_iter(ctx, key, match_columns, compare).next()
    }

    /// Lazy scan from the boundary `compare` selects
    ///
    /// EQ, GE and GT walk forward; EQ stops after the last equal row. LE and
    /// LT walk backward from the last satisfying row.
    pub fn find_iter(
        &self,
        ctx: &VisibilityContext,
        key: &[Value],
        match_columns: usize,
        compare: CompareType,
    ) -> IndexScan<'_, P> {
        let bound = ScanBound::keyed(key, match_columns, compare);
        let tree = self.tree.read();
        let provider = self.provider.as_ref();
        let key_order = |row: &P::Row| {
            self.comparator
                .compare_key(provider, row, &bound.key, bound.match_columns)
        };

        let start = match compare {
            CompareType::Eq => tree.first_where(|row| CompareType::Ge.admits(key_order(row))),
            CompareType::Ge | CompareType::Gt => {
                tree.first_where(|row| compare.admits(key_order(row)))
            }
            CompareType::Le | CompareType::Lt => {
                tree.last_where(|row| compare.admits(key_order(row)))
            }
        };
        self.make_scan(ctx, tree, start, bound)
    }

    /// Every visible row in `direction`
    pub fn scan(&self, ctx: &VisibilityContext, direction: ScanDirection) -> IndexScan<'_, P> {
        let tree = self.tree.read();
        let start = match direction {
            ScanDirection::Forward => tree.first(),
            ScanDirection::Backward => tree.last(),
        };
        self.make_scan(ctx, tree, start, ScanBound::full(direction))
    }

    /// Every row in `direction`, visible or not
    pub fn raw_scan(&self, direction: ScanDirection) -> RawScan<'_, P> {
        let tree = self.tree.read();
        let start = match direction {
            ScanDirection::Forward => tree.first(),
            ScanDirection::Backward => tree.last(),
        };
        RawScan::new(
            tree,
            self.provider.as_ref(),
            &self.comparator,
            start,
            ScanBound::full(direction),
        )
    }

    /// Continue a scan strictly after the cursor's last row
    ///
    /// A cursor that has not yielded anything restarts its scan.
    pub fn resume(
        &self,
        ctx: &VisibilityContext,
        cursor: &ScanCursor<P::Row>,
    ) -> IndexScan<'_, P> {
        let bound = cursor.bound.clone();
        let Some(last) = cursor.last.as_ref() else {
            return match bound.compare {
                Some(compare) => self.find_iter(ctx, &bound.key, bound.match_columns, compare),
                None => self.scan(ctx, bound.direction),
            };
        };

        let tree = self.tree.read();
        let start = match bound.direction {
            ScanDirection::Forward => {
                tree.first_where(|row| self.order(row, last) == Ordering::Greater)
            }
            ScanDirection::Backward => {
                tree.last_where(|row| self.order(row, last) == Ordering::Less)
            }
        };
        self.make_scan(ctx, tree, start, bound)
    }

    fn make_scan<'a>(
        &'a self,
        ctx: &VisibilityContext,
        tree: RwLockReadGuard<'a, AvlTree<P::Row>>,
        start: Slot,
        bound: ScanBound,
    ) -> IndexScan<'a, P> {
        let provider = self.provider.as_ref();
        let raw = RawScan::new(tree, provider, &self.comparator, start, bound);
        IndexScan::new(provider, *ctx, raw)
    }

    /// First visible row in index order
    pub fn first_row(&self, ctx: &VisibilityContext) -> Option<P::Row> {
        self.scan(ctx, ScanDirection::Forward).next()
    }

    /// Last visible row in index order
    pub fn last_row(&self, ctx: &VisibilityContext) -> Option<P::Row> {
        self.scan(ctx, ScanDirection::Backward).next()
    }

    /// Check tree structure and ordering with an independent walker
    pub fn verify(&self) -> Result<TreeStats> {
        let tree = self.tree.read();
        tree.verify(|a, b| self.order(a, b))
    }
}

impl<P: RowProvider> fmt::Debug for OrderedIndex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedIndex")
            .field("metadata", &self.metadata)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NullsOrder;
    use crate::storage::traits::{CommittedRows, KeyedRow};

    fn int_index(config: IndexConfig) -> OrderedIndex<CommittedRows> {
        OrderedIndex::new(config, Arc::new(CommittedRows::new())).unwrap()
    }

    fn int_row(id: i64, key: i64) -> KeyedRow {
        KeyedRow::new(id, vec![Value::integer(key)])
    }

    fn keys(rows: impl Iterator<Item = KeyedRow>) -> Vec<i64> {
        rows.filter_map(|r| r.values[0].as_int64()).collect()
    }

    fn ctx() -> VisibilityContext {
        VisibilityContext::default()
    }

    #[test]
    fn test_insert_and_scan() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for (id, k) in [5, 3, 8, 1, 4, 7, 9].into_iter().enumerate() {
            assert!(index.insert(int_row(id as i64, k)).unwrap());
        }
        assert_eq!(
            keys(index.scan(&ctx(), ScanDirection::Forward)),
            vec![1, 3, 4, 5, 7, 8, 9]
        );
        assert_eq!(
            keys(index.scan(&ctx(), ScanDirection::Backward)),
            vec![9, 8, 7, 5, 4, 3, 1]
        );
        assert_eq!(
            index.first_row(&ctx()).unwrap().values[0],
            Value::integer(1)
        );
        assert_eq!(
            index.last_row(&ctx()).unwrap().values[0],
            Value::integer(9)
        );
        assert!(index.height() <= 3);
        index.verify().unwrap();
    }

    #[test]
    fn test_duplicate_row_is_noop() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        assert!(index.insert(int_row(1, 10)).unwrap());
        assert!(!index.insert(int_row(1, 10)).unwrap());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_unique_rejects_equal_key() {
        let index = int_index(
            IndexConfig::new("pk_idx")
                .with_column(IndexColumn::ascending(0))
                .primary_key(),
        );
        index.insert(int_row(1, 10)).unwrap();
        index.insert(int_row(2, 20)).unwrap();
        let err = index.insert(int_row(3, 10)).unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(err, Error::unique_constraint("pk_idx", "(10)"));
        assert_eq!(index.len(), 2);
        index.verify().unwrap();
    }

    #[test]
    fn test_unique_allows_null_keys() {
        let index = int_index(
            IndexConfig::new("u")
                .with_column(IndexColumn::ascending(0))
                .unique(),
        );
        index.insert(KeyedRow::new(1, vec![Value::Null])).unwrap();
        index.insert(KeyedRow::new(2, vec![Value::Null])).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_delete() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for id in 0..20 {
            index.insert(int_row(id, id % 5)).unwrap();
        }
        assert!(index.delete(&int_row(7, 2)));
        assert!(!index.delete(&int_row(7, 2)));
        // Same key, different identity
        assert!(!index.delete(&int_row(99, 2)));
        assert!(!index.contains(&int_row(7, 2)));
        assert!(index.contains(&int_row(12, 2)));
        assert_eq!(index.len(), 19);
        index.verify().unwrap();
    }

    #[test]
    fn test_find_operators() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for (id, k) in [10, 20, 30, 40].into_iter().enumerate() {
            index.insert(int_row(id as i64, k)).unwrap();
        }
        let key = [Value::integer(25)];
        let at = |c| {
            index
                .find(&ctx(), &key, 1, c)
                .and_then(|r| r.values[0].as_int64())
        };
        assert_eq!(at(CompareType::Eq), None);
        assert_eq!(at(CompareType::Ge), Some(30));
        assert_eq!(at(CompareType::Gt), Some(30));
        assert_eq!(at(CompareType::Le), Some(20));
        assert_eq!(at(CompareType::Lt), Some(20));

        let key = [Value::integer(30)];
        assert_eq!(
            keys(index.find_iter(&ctx(), &key, 1, CompareType::Gt)),
            vec![40]
        );
        assert_eq!(
            keys(index.find_iter(&ctx(), &key, 1, CompareType::Le)),
            vec![30, 20, 10]
        );
        assert_eq!(
            keys(index.find_iter(&ctx(), &key, 1, CompareType::Eq)),
            vec![30]
        );
    }

    #[test]
    fn test_find_eq_is_deterministic() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for (id, k) in [(4, 5), (1, 3), (9, 5), (2, 7)] {
            index.insert(int_row(id, k)).unwrap();
        }
        let key = [Value::integer(5)];
        let first = index.find(&ctx(), &key, 1, CompareType::Eq).unwrap();
        assert_eq!(first.row_id, 4);
        for _ in 0..10 {
            assert_eq!(
                index.find(&ctx(), &key, 1, CompareType::Eq),
                Some(first.clone())
            );
        }
        let ids: Vec<i64> = index
            .find_iter(&ctx(), &key, 1, CompareType::Eq)
            .map(|r| r.row_id)
            .collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn test_multi_column_prefix_search() {
        let index = int_index(
            IndexConfig::new("ab")
                .with_column(IndexColumn::ascending(0))
                .with_column(IndexColumn::descending(1)),
        );
        let rows = [(1, 1, 1), (2, 1, 3), (3, 2, 1), (4, 1, 2), (5, 2, 5)];
        for (id, a, b) in rows {
            index
                .insert(KeyedRow::new(id, vec![Value::integer(a), Value::integer(b)]))
                .unwrap();
        }
        let ids: Vec<i64> = index
            .find_iter(&ctx(), &[Value::integer(1)], 1, CompareType::Eq)
            .map(|r| r.row_id)
            .collect();
        // a = 1, b descending
        assert_eq!(ids, vec![2, 4, 1]);

        let hit = index
            .find(&ctx(), &[Value::integer(2), Value::integer(5)], 2, CompareType::Eq)
            .unwrap();
        assert_eq!(hit.row_id, 5);
    }

    #[test]
    fn test_nulls_placement() {
        let index = int_index(
            IndexConfig::new("n")
                .with_column(IndexColumn::descending(0).with_nulls(NullsOrder::Last)),
        );
        index.insert(KeyedRow::new(1, vec![Value::Null])).unwrap();
        index.insert(int_row(2, 1)).unwrap();
        index.insert(int_row(3, 2)).unwrap();
        let ids: Vec<i64> = index
            .scan(&ctx(), ScanDirection::Forward)
            .map(|r| r.row_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_resume_after_mutation() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for k in 0..10 {
            index.insert(int_row(k, k)).unwrap();
        }
        let cursor = {
            let mut scan = index.find_iter(&ctx(), &[Value::integer(3)], 1, CompareType::Ge);
            assert_eq!(keys(scan.by_ref().take(2)), vec![3, 4]);
            scan.cursor()
        };

        index.delete(&int_row(5, 5));
        index.insert(int_row(45, 4)).unwrap();

        // Row 45 sorts after row 4 (same key, larger id)
        let rest: Vec<i64> = index.resume(&ctx(), &cursor).map(|r| r.row_id).collect();
        assert_eq!(rest, vec![45, 6, 7, 8, 9]);
    }

    #[test]
    fn test_resume_fresh_cursor_restarts() {
        let index = int_index(IndexConfig::new("idx").with_column(IndexColumn::ascending(0)));
        for k in 0..3 {
            index.insert(int_row(k, k)).unwrap();
        }
        let cursor = index.scan(&ctx(), ScanDirection::Backward).cursor();
        assert!(cursor.last.is_none());
        assert_eq!(keys(index.resume(&ctx(), &cursor)), vec![2, 1, 0]);
    }

    #[test]
    fn test_column_out_of_range() {
        let err = OrderedIndex::new(
            IndexConfig::new("bad").with_column(IndexColumn::ascending(3)),
            Arc::new(CommittedRows::with_columns(2)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfRange { position: 3, .. }));
    }

    #[test]
    fn test_metadata() {
        let index = int_index(
            IndexConfig::new("m")
                .with_persistence_id(42)
                .with_column(IndexColumn::ascending(0))
                .with_column(IndexColumn::descending(2).nulls_last()),
        );
        let meta = index.metadata();
        assert_eq!(meta.name(), "m");
        assert_eq!(meta.persistence_id(), 42);
        assert_eq!(meta.column_positions().as_slice(), &[0, 2]);
        assert_eq!(meta.descending().as_slice(), &[false, true]);
        assert_eq!(meta.nulls_last().as_slice(), &[false, true]);
        assert!(!meta.is_unique());
        assert!(!meta.is_forward());

        let fk = int_index(
            IndexConfig::new("fk")
                .with_column(IndexColumn::ascending(0))
                .forward(),
        );
        assert!(fk.metadata().is_forward());
        assert!(fk.metadata().is_constraint());
    }
}
