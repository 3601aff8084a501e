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

//! Multi-column row comparator
//!
//! Rows compare on the first key column whose projected values differ.
//! NULL placement is absolute: `NullsOrder::First` puts NULLs at the start
//! of the index whether the column is ascending or descending.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::core::{NullsOrder, SortDirection, Value};
use crate::storage::traits::RowProvider;

/// One key column of an ordered index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexColumn {
    /// Column position passed to `RowProvider::project`
    pub position: usize,
    pub direction: SortDirection,
    pub nulls: NullsOrder,
}

impl IndexColumn {
    /// Ascending, NULLs first
    pub fn ascending(position: usize) -> Self {
        Self {
            position,
            direction: SortDirection::Ascending,
            nulls: NullsOrder::First,
        }
    }

    /// Descending, NULLs first
    pub fn descending(position: usize) -> Self {
        Self {
            position,
            direction: SortDirection::Descending,
            nulls: NullsOrder::First,
        }
    }

    pub fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = nulls;
        self
    }

    pub fn nulls_last(self) -> Self {
        self.with_nulls(NullsOrder::Last)
    }

    #[inline]
    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Descending
    }

    #[inline]
    pub fn is_nulls_last(&self) -> bool {
        self.nulls == NullsOrder::Last
    }

    /// Order of `a` relative to `b` in this column
    #[inline]
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => self.null_side(),
            (false, true) => self.null_side().reverse(),
            (false, false) => {
                let ord = a.compare(b);
                if self.is_descending() {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }

    #[inline]
    fn null_side(&self) -> Ordering {
        match self.nulls {
            NullsOrder::First => Ordering::Less,
            NullsOrder::Last => Ordering::Greater,
        }
    }
}

/// Ordered list of key columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    columns: SmallVec<[IndexColumn; 4]>,
}

impl Comparator {
    pub fn new(columns: impl IntoIterator<Item = IndexColumn>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Number of key columns
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Compare two rows on all key columns
    pub fn compare_rows<P: RowProvider>(&self, provider: &P, a: &P::Row, b: &P::Row) -> Ordering {
        for column in &self.columns {
            let left = provider.project(a, column.position);
            let right = provider.project(b, column.position);
            let ord = column.compare(&left, &right);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Compare a row against a search key on the first `match_columns` columns
    ///
    /// `match_columns` is clamped to the key length and the column count.
    pub fn compare_key<P: RowProvider>(
        &self,
        provider: &P,
        row: &P::Row,
        key: &[Value],
        match_columns: usize,
    ) -> Ordering {
        let n = match_columns.min(key.len()).min(self.columns.len());
        for (column, wanted) in self.columns[..n].iter().zip(key) {
            let value = provider.project(row, column.position);
            let ord = column.compare(&value, wanted);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Key column values of `row`
    pub fn project_key<P: RowProvider>(&self, provider: &P, row: &P::Row) -> SmallVec<[Value; 4]> {
        self.columns
            .iter()
            .map(|c| provider.project(row, c.position))
            .collect()
    }

    /// Returns true if any key column of `row` is NULL
    pub fn has_null_key<P: RowProvider>(&self, provider: &P, row: &P::Row) -> bool {
        self.columns
            .iter()
            .any(|c| provider.project(row, c.position).is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::{CommittedRows, KeyedRow};

    fn row(id: i64, values: Vec<Value>) -> KeyedRow {
        KeyedRow::new(id, values)
    }

    #[test]
    fn test_column_direction() {
        let asc = IndexColumn::ascending(0);
        let desc = IndexColumn::descending(0);
        let one = Value::integer(1);
        let two = Value::integer(2);
        assert_eq!(asc.compare(&one, &two), Ordering::Less);
        assert_eq!(desc.compare(&one, &two), Ordering::Greater);
        assert_eq!(asc.compare(&two, &two), Ordering::Equal);
    }

    #[test]
    fn test_null_placement_is_absolute() {
        let null = Value::Null;
        let one = Value::integer(1);
        for column in [IndexColumn::ascending(0), IndexColumn::descending(0)] {
            assert_eq!(column.compare(&null, &one), Ordering::Less);
            assert_eq!(column.nulls_last().compare(&null, &one), Ordering::Greater);
            assert_eq!(column.compare(&null, &null), Ordering::Equal);
        }
    }

    #[test]
    fn test_multi_column_cascade() {
        let provider = CommittedRows::new();
        let cmp = Comparator::new([IndexColumn::ascending(0), IndexColumn::descending(1)]);
        let a = row(1, vec![Value::integer(1), Value::text("b")]);
        let b = row(2, vec![Value::integer(1), Value::text("a")]);
        let c = row(3, vec![Value::integer(2), Value::text("z")]);

        // Equal first column, second column descending
        assert_eq!(cmp.compare_rows(&provider, &a, &b), Ordering::Less);
        assert_eq!(cmp.compare_rows(&provider, &b, &c), Ordering::Less);
        assert_eq!(cmp.compare_rows(&provider, &a, &a), Ordering::Equal);
    }

    #[test]
    fn test_compare_key_prefix() {
        let provider = CommittedRows::new();
        let cmp = Comparator::new([IndexColumn::ascending(0), IndexColumn::ascending(1)]);
        let r = row(1, vec![Value::integer(5), Value::integer(9)]);

        assert_eq!(
            cmp.compare_key(&provider, &r, &[Value::integer(5)], 1),
            Ordering::Equal
        );
        assert_eq!(
            cmp.compare_key(&provider, &r, &[Value::integer(5), Value::integer(10)], 2),
            Ordering::Less
        );
        // match_columns larger than the key is clamped
        assert_eq!(
            cmp.compare_key(&provider, &r, &[Value::integer(4)], 2),
            Ordering::Greater
        );
    }

    #[test]
    fn test_has_null_key() {
        let provider = CommittedRows::new();
        let cmp = Comparator::new([IndexColumn::ascending(0), IndexColumn::ascending(1)]);
        assert!(cmp.has_null_key(&provider, &row(1, vec![Value::integer(1), Value::Null])));
        assert!(cmp.has_null_key(&provider, &row(1, vec![Value::integer(1)])));
        assert!(!cmp.has_null_key(
            &provider,
            &row(1, vec![Value::integer(1), Value::integer(2)])
        ));
    }
}
