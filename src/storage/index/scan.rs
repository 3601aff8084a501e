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

//! Lazy index scans and resumable cursors
//!
//! [`RawScan`] walks tree nodes in one direction while holding the index
//! read lock. [`IndexScan`] runs a raw scan through the visibility filter
//! and remembers the last row it handed out, so the scan can be resumed
//! later with [`OrderedIndex::resume`](super::OrderedIndex::resume).

use std::cmp::Ordering;

use parking_lot::RwLockReadGuard;
use smallvec::SmallVec;

use crate::core::{CompareType, ScanDirection, Value};
use crate::storage::arena::{Slot, NIL};
use crate::storage::mvcc::{VisibilityContext, VisibilityFilter};
use crate::storage::traits::RowProvider;

use super::avl::AvlTree;
use super::comparator::Comparator;

/// Search key and operator a scan was started with
#[derive(Debug, Clone, PartialEq)]
pub struct ScanBound {
    pub key: SmallVec<[Value; 4]>,
    pub match_columns: usize,
    /// `None` for a full scan
    pub compare: Option<CompareType>,
    pub direction: ScanDirection,
}

impl ScanBound {
    /// Unbounded scan in `direction`
    pub fn full(direction: ScanDirection) -> Self {
        Self {
            key: SmallVec::new(),
            match_columns: 0,
            compare: None,
            direction,
        }
    }

    /// Scan positioned by `compare` against the first `match_columns` of `key`
    pub fn keyed(key: &[Value], match_columns: usize, compare: CompareType) -> Self {
        let match_columns = match_columns.min(key.len());
        Self {
            key: key[..match_columns].iter().cloned().collect(),
            match_columns,
            compare: Some(compare),
            direction: compare.scan_direction(),
        }
    }

    /// Returns true if the scan stops after the rows equal to its key
    #[inline]
    pub fn is_equality(&self) -> bool {
        self.compare == Some(CompareType::Eq)
    }
}

/// Position of a scan: the last row it yielded and how it was bounded
///
/// The cursor records a row, not a node, so it stays meaningful across
/// inserts and deletes on the index.
#[derive(Debug, Clone)]
pub struct ScanCursor<R> {
    pub last: Option<R>,
    pub bound: ScanBound,
}

/// Unfiltered walk over index rows
///
/// Holds the index read lock until dropped.
pub struct RawScan<'a, P: RowProvider> {
    tree: RwLockReadGuard<'a, AvlTree<P::Row>>,
    provider: &'a P,
    comparator: &'a Comparator,
    current: Slot,
    bound: ScanBound,
}

impl<'a, P: RowProvider> RawScan<'a, P> {
    pub(crate) fn new(
        tree: RwLockReadGuard<'a, AvlTree<P::Row>>,
        provider: &'a P,
        comparator: &'a Comparator,
        start: Slot,
        bound: ScanBound,
    ) -> Self {
        Self {
            tree,
            provider,
            comparator,
            current: start,
            bound,
        }
    }

    pub fn bound(&self) -> &ScanBound {
        &self.bound
    }
}

impl<P: RowProvider> Iterator for RawScan<'_, P> {
    type Item = P::Row;

    fn next(&mut self) -> Option<P::Row> {
        if self.current == NIL {
            return None;
        }
        let slot = self.current;
        let row = self.tree.row(slot);

        if self.bound.is_equality()
            && self.comparator.compare_key(
                self.provider,
                row,
                &self.bound.key,
                self.bound.match_columns,
            ) != Ordering::Equal
        {
            self.current = NIL;
            return None;
        }

        self.current = match self.bound.direction {
            ScanDirection::Forward => self.tree.next(slot),
            ScanDirection::Backward => self.tree.prev(slot),
        };
        Some(row.clone())
    }
}

/// Visibility-filtered, resumable index scan
pub struct IndexScan<'a, P: RowProvider> {
    inner: VisibilityFilter<'a, P, RawScan<'a, P>>,
    last: Option<P::Row>,
}

impl<'a, P: RowProvider> IndexScan<'a, P> {
    pub(crate) fn new(provider: &'a P, ctx: VisibilityContext, raw: RawScan<'a, P>) -> Self {
        Self {
            inner: VisibilityFilter::new(provider, ctx, raw),
            last: None,
        }
    }

    /// Cursor positioned after the last row yielded so far
    pub fn cursor(&self) -> ScanCursor<P::Row> {
        ScanCursor {
            last: self.last.clone(),
            bound: self.inner.inner().bound().clone(),
        }
    }

    /// Rows skipped as invisible so far
    pub fn skipped(&self) -> usize {
        self.inner.skipped()
    }

    pub fn context(&self) -> &VisibilityContext {
        self.inner.context()
    }
}

impl<P: RowProvider> Iterator for IndexScan<'_, P> {
    type Item = P::Row;

    fn next(&mut self) -> Option<P::Row> {
        let row = self.inner.next()?;
        self.last = Some(row.clone());
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_bound_clamps_columns() {
        let key = [Value::integer(1), Value::integer(2)];
        let bound = ScanBound::keyed(&key, 5, CompareType::Le);
        assert_eq!(bound.match_columns, 2);
        assert_eq!(bound.direction, ScanDirection::Backward);
        assert!(!bound.is_equality());

        let bound = ScanBound::keyed(&key, 1, CompareType::Eq);
        assert_eq!(bound.key.len(), 1);
        assert!(bound.is_equality());
    }

    #[test]
    fn test_full_bound() {
        let bound = ScanBound::full(ScanDirection::Forward);
        assert_eq!(bound.compare, None);
        assert!(!bound.is_equality());
    }
}
