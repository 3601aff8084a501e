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

//! Row type for Rowdex - an immutable collection of column values
//!
//! The indexing core never mutates row payloads, so a row is a shared
//! `Arc<[Value]>` and cloning one is O(1).

use std::fmt;
use std::ops::{Deref, Index};
use std::sync::Arc;

use super::value::Value;

/// A row of column values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Arc<[Value]>,
}

impl Row {
    /// Create a row from a vector of values
    #[inline]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            values: Arc::from(values.into_boxed_slice()),
        }
    }

    /// Create a row sharing an existing Arc (zero-copy)
    #[inline]
    pub fn from_arc(values: Arc<[Value]>) -> Self {
        Self { values }
    }

    /// Get the value at column position, if present
    #[inline]
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Number of columns
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the column values
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Returns the shared backing storage
    #[inline]
    pub fn as_arc(&self) -> &Arc<[Value]> {
        &self.values
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::from_values(Vec::new())
    }
}

impl Deref for Row {
    type Target = [Value];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::from_values(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}
