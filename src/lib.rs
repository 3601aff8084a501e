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

//! # Rowdex - hash and ordered indexing with MVCC visibility
//!
//! Rowdex is the indexing core of a row store. It locates rows by key and
//! orders them by column, and leaves row storage, SQL and durability to the
//! surrounding system.
//!
//! ## Key Features
//!
//! - **Hash maps and sets** - chained buckets over a slot arena, doubling rehash
//! - **Three key/value representations** - opaque reference, `i32`, `i64`
//! - **Access tracking** - optional per-slot recency stamps for eviction layers
//! - **AVL ordered indexes** - multi-column comparator with per-column direction
//!   and NULL placement, unique constraints, EQ/GE/GT/LE/LT search
//! - **MVCC visibility** - every scan filters rows through a per-call context;
//!   READ COMMITTED and SNAPSHOT isolation
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rowdex::{
//!     BaseMap, CommittedRows, CompareType, Datum, IndexColumn, IndexConfig, KeyedRow,
//!     MapConfig, OrderedIndex, Representation, Value, VisibilityContext,
//! };
//!
//! // Hash map with 64-bit integer keys and values
//! let mut map: BaseMap<String> =
//!     BaseMap::new(MapConfig::new(Representation::Int64, Representation::Int64)).unwrap();
//! map.put(Datum::Long(1), Datum::Long(100)).unwrap();
//! assert_eq!(map.get(&Datum::Long(1)), Some(Datum::Long(100)));
//!
//! // Ordered index on column 0
//! let index = OrderedIndex::new(
//!     IndexConfig::new("by_id").with_column(IndexColumn::ascending(0)),
//!     Arc::new(CommittedRows::new()),
//! )
//! .unwrap();
//! for (id, k) in [(1, 5), (2, 3), (3, 8)] {
//!     index.insert(KeyedRow::new(id, vec![Value::integer(k)])).unwrap();
//! }
//! let ctx = VisibilityContext::default();
//! let hit = index.find(&ctx, &[Value::integer(4)], 1, CompareType::Ge).unwrap();
//! assert_eq!(hit.row_id, 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Value`], [`Row`], [`Error`])
//! - [`storage`] - Arena, hash maps, ordered indexes, MVCC visibility
//! - [`common`] - Hashing utilities

pub mod common;
pub mod core;
pub mod storage;

// Re-export main types for convenience
pub use core::{
    CompareType, Error, IsolationLevel, NullsOrder, Representation, Result, Row, ScanDirection,
    SortDirection, Value,
};

// Re-export config types
pub use storage::{IndexConfig, MapConfig};

// Re-export hash types
pub use storage::{AccessManager, BaseMap, Datum, HashIndex, SharedMap, Slot, SlotArena, NIL};

// Re-export index types
pub use storage::{
    AvlTree, Comparator, IndexColumn, IndexMetadata, IndexScan, OrderedIndex, ScanCursor,
    TreeStats,
};

// Re-export MVCC types
pub use storage::{
    CommittedRows, KeyedRow, RowProvider, RowRef, RowVersion, TransactionRegistry, VersionedRows,
    VisibilityContext, VisibilityFilter, BOOTSTRAP_TRANSACTION_ID,
};
