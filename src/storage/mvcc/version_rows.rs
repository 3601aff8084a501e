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

//! Versioned row store
//!
//! Rows are appended with the id of the transaction that created them and
//! marked with the id of the transaction that deletes them. Handles
//! ([`RowRef`]) stay valid for the life of the store, which is what lets an
//! ordered index hold them without owning row content.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{Error, Result, Row, Value};
use crate::storage::traits::RowProvider;

use super::registry::TransactionRegistry;
use super::visibility::VisibilityContext;

/// Handle to one version in a [`VersionedRows`] store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRef(u32);

impl RowRef {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One row version with its transaction metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RowVersion {
    pub row_id: i64,
    pub values: Row,
    pub created_by: i64,
    /// Deleting transaction, if any
    pub deleted_by: Option<i64>,
}

/// Append-only store of row versions checked against a transaction registry
pub struct VersionedRows {
    registry: Arc<TransactionRegistry>,
    versions: RwLock<Vec<RowVersion>>,
    columns: Option<usize>,
}

impl VersionedRows {
    pub fn new(registry: Arc<TransactionRegistry>) -> Self {
        Self {
            registry,
            versions: RwLock::new(Vec::new()),
            columns: None,
        }
    }

    /// Declare the column count so index construction can check positions
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn registry(&self) -> &Arc<TransactionRegistry> {
        &self.registry
    }

    /// Append a version created by the active transaction `txn_id`
    pub fn insert(&self, txn_id: i64, row_id: i64, values: impl Into<Row>) -> Result<RowRef> {
        if !self.registry.is_active(txn_id) {
            return Err(Error::TransactionNotActive(txn_id));
        }
        let mut versions = self.versions.write();
        let index = u32::try_from(versions.len())
            .map_err(|_| Error::capacity_exhausted(versions.len() + 1, u32::MAX as usize))?;
        versions.push(RowVersion {
            row_id,
            values: values.into(),
            created_by: txn_id,
            deleted_by: None,
        });
        Ok(RowRef(index))
    }

    /// Mark `row` deleted by the active transaction `txn_id`
    ///
    /// Returns false when the row is unknown or another live transaction
    /// already deleted it. A delete by an aborted transaction is overwritten.
    pub fn delete(&self, txn_id: i64, row: RowRef) -> Result<bool> {
        if !self.registry.is_active(txn_id) {
            return Err(Error::TransactionNotActive(txn_id));
        }
        let mut versions = self.versions.write();
        let Some(version) = versions.get_mut(row.index()) else {
            return Ok(false);
        };
        if let Some(deleter) = version.deleted_by {
            if deleter == txn_id
                || self.registry.is_active(deleter)
                || self.registry.is_committed(deleter)
            {
                return Ok(false);
            }
        }
        version.deleted_by = Some(txn_id);
        Ok(true)
    }

    /// Copy of the version behind `row`
    pub fn get(&self, row: RowRef) -> Option<RowVersion> {
        self.versions.read().get(row.index()).cloned()
    }

    /// Values of `row`
    pub fn values(&self, row: RowRef) -> Option<Row> {
        self.versions
            .read()
            .get(row.index())
            .map(|v| v.values.clone())
    }

    /// Number of stored versions, visible or not
    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }

    /// Whether `version` may be observed under `ctx`
    fn version_visible(&self, version: &RowVersion, ctx: &VisibilityContext) -> bool {
        if !self.registry.is_visible_in(version.created_by, ctx) {
            return false;
        }
        match version.deleted_by {
            Some(deleter) => !self.registry.is_visible_in(deleter, ctx),
            None => true,
        }
    }
}

impl RowProvider for VersionedRows {
    type Row = RowRef;

    fn project(&self, row: &RowRef, position: usize) -> Value {
        self.versions
            .read()
            .get(row.index())
            .and_then(|v| v.values.get(position).cloned())
            .unwrap_or(Value::Null)
    }

    fn row_id(&self, row: &RowRef) -> i64 {
        self.versions
            .read()
            .get(row.index())
            .map_or(i64::MIN, |v| v.row_id)
    }

    fn version_id(&self, row: &RowRef) -> u64 {
        u64::from(row.0)
    }

    fn is_live_for(&self, row: &RowRef, ctx: &VisibilityContext) -> bool {
        let versions = self.versions.read();
        let Some(version) = versions.get(row.index()) else {
            return false;
        };
        if self.registry.is_aborted(version.created_by) {
            return false;
        }
        match version.deleted_by {
            Some(deleter) => !self.registry.is_visible_in(deleter, ctx),
            None => true,
        }
    }

    fn is_visible(&self, row: &RowRef, ctx: &VisibilityContext) -> bool {
        match self.versions.read().get(row.index()) {
            Some(version) => self.version_visible(version, ctx),
            None => false,
        }
    }

    fn column_count(&self) -> Option<usize> {
        self.columns
    }
}
