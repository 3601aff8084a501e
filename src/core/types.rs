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

//! Core type definitions for Rowdex
//!
//! This module defines the fundamental enums: Representation, CompareType,
//! SortDirection, NullsOrder, ScanDirection and IsolationLevel

use std::fmt;

/// Storage representation of a map's keys or values
///
/// Chosen once at construction; a map is homogeneous in its key
/// representation and independently homogeneous in its value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Representation {
    /// Opaque reference compared through the caller's `Eq + Hash`
    #[default]
    Reference = 0,

    /// 32-bit signed integer, identity-hashed
    Int32 = 1,

    /// 64-bit signed integer, identity-hashed
    Int64 = 2,
}

impl Representation {
    /// Returns true for the two integer representations
    pub fn is_integer(&self) -> bool {
        matches!(self, Representation::Int32 | Representation::Int64)
    }

    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create Representation from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Representation::Reference),
            1 => Some(Representation::Int32),
            2 => Some(Representation::Int64),
            _ => None,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Reference => write!(f, "REFERENCE"),
            Representation::Int32 => write!(f, "INT32"),
            Representation::Int64 => write!(f, "INT64"),
        }
    }
}

/// Relational operator used to position an index search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompareType {
    /// Equality (=)
    Eq = 0,

    /// Greater than or equal (>=)
    Ge = 1,

    /// Greater than (>)
    Gt = 2,

    /// Less than or equal (<=)
    Le = 3,

    /// Less than (<)
    Lt = 4,
}

impl CompareType {
    /// Direction a range scan started by this operator walks the index
    pub fn scan_direction(&self) -> ScanDirection {
        match self {
            CompareType::Eq | CompareType::Ge | CompareType::Gt => ScanDirection::Forward,
            CompareType::Le | CompareType::Lt => ScanDirection::Backward,
        }
    }

    /// Returns true if a row comparing `ord` against the search key satisfies
    /// this operator
    #[inline]
    pub fn admits(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareType::Eq => ord == Equal,
            CompareType::Ge => ord != Less,
            CompareType::Gt => ord == Greater,
            CompareType::Le => ord != Greater,
            CompareType::Lt => ord == Less,
        }
    }
}

impl fmt::Display for CompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareType::Eq => write!(f, "="),
            CompareType::Ge => write!(f, ">="),
            CompareType::Gt => write!(f, ">"),
            CompareType::Le => write!(f, "<="),
            CompareType::Lt => write!(f, "<"),
        }
    }
}

/// Per-column sort direction of an ordered index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Placement of NULLs relative to non-null values in index order
///
/// Placement is absolute: `First` puts NULLs at the start of a forward
/// traversal whatever the column's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullsOrder {
    #[default]
    First,
    Last,
}

/// Direction of an index traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanDirection {
    #[default]
    Forward,
    Backward,
}

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IsolationLevel {
    /// Read committed: transactions see only committed data
    #[default]
    ReadCommitted = 0,

    /// Snapshot isolation (equivalent to Repeatable Read):
    /// transactions see a consistent snapshot from the start
    SnapshotIsolation = 1,
}

impl IsolationLevel {
    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create IsolationLevel from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(IsolationLevel::ReadCommitted),
            1 => Some(IsolationLevel::SnapshotIsolation),
            _ => None,
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::SnapshotIsolation => write!(f, "SNAPSHOT ISOLATION"),
        }
    }
}
