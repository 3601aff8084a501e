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

//! Row provider trait
//!
//! The ordered index never owns row payloads. It stores cheap row handles
//! and asks a `RowProvider` to project column values, identify rows and
//! decide visibility. Providers must answer consistently for as long as the
//! index holds a handle.

use crate::core::{Row, Value};
use crate::storage::mvcc::VisibilityContext;

/// Source of row content and visibility for an ordered index
pub trait RowProvider: Send + Sync {
    /// Handle stored in index nodes
    type Row: Clone + Default + Send + Sync;

    /// Value of column `position` in `row`; out-of-range positions are NULL
    fn project(&self, row: &Self::Row, position: usize) -> Value;

    /// Logical row identity used to order rows with equal keys
    ///
    /// Every version of one logical row may share it.
    fn row_id(&self, row: &Self::Row) -> i64;

    /// Identity of this particular stored version among rows sharing a
    /// `row_id`; the last tie-breaker of index order
    ///
    /// Providers that store a single version per row keep the default.
    fn version_id(&self, _row: &Self::Row) -> u64 {
        0
    }

    /// Whether `row` may be observed under `ctx`
    fn is_visible(&self, row: &Self::Row, ctx: &VisibilityContext) -> bool;

    /// Whether `row` still claims its key for a writer in `ctx`
    ///
    /// Unique indexes ignore rows for which this is false when checking an
    /// insert made under `ctx`: rows whose delete `ctx` can see and rows of
    /// aborted transactions.
    fn is_live_for(&self, _row: &Self::Row, _ctx: &VisibilityContext) -> bool {
        true
    }

    /// Number of projectable columns, if known
    ///
    /// When present, index construction rejects key columns at or past it.
    fn column_count(&self) -> Option<usize> {
        None
    }
}

/// A row carried by value together with its identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyedRow {
    pub row_id: i64,
    pub values: Row,
}

impl KeyedRow {
    pub fn new(row_id: i64, values: impl Into<Row>) -> Self {
        Self {
            row_id,
            values: values.into(),
        }
    }
}

/// Provider for rows that are all committed and visible to everyone
#[derive(Debug, Clone, Copy, Default)]
pub struct CommittedRows {
    columns: Option<usize>,
}

impl CommittedRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the column count so index construction can check positions
    pub fn with_columns(columns: usize) -> Self {
        Self {
            columns: Some(columns),
        }
    }
}

impl RowProvider for CommittedRows {
    type Row = KeyedRow;

    #[inline]
    fn project(&self, row: &KeyedRow, position: usize) -> Value {
        row.values.get(position).cloned().unwrap_or(Value::Null)
    }

    #[inline]
    fn row_id(&self, row: &KeyedRow) -> i64 {
        row.row_id
    }

    #[inline]
    fn is_visible(&self, _row: &KeyedRow, _ctx: &VisibilityContext) -> bool {
        true
    }

    fn column_count(&self) -> Option<usize> {
        self.columns
    }
}
