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

//! Storage module for Rowdex
//!
//! This module contains the storage layer components including:
//! - Slot arena shared by hash chains and tree nodes
//! - Hash-indexed maps and sets
//! - AVL ordered indexes with range scans
//! - MVCC visibility (transaction registry, visibility filter, versioned rows)
//! - Configuration types

pub mod arena;
pub mod config;
pub mod hash;
pub mod index;
pub mod mvcc;
pub mod traits;

// Re-export arena types
pub use arena::{Slot, SlotArena, NIL};

// Re-export config types
pub use config::{IndexConfig, MapConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_SLOTS};

// Re-export hash types
pub use hash::{AccessManager, BaseMap, Datum, HashIndex, KeyValueStore, SharedMap, SlotColumn};

// Re-export index types
pub use index::{
    AvlTree, Comparator, IndexColumn, IndexMetadata, IndexScan, OrderedIndex, RawScan, ScanBound,
    ScanCursor, TreeStats,
};

// Re-export MVCC types
pub use mvcc::{
    RowRef, RowVersion, TransactionRegistry, VersionedRows, VisibilityContext, VisibilityFilter,
    BOOTSTRAP_TRANSACTION_ID,
};

// Re-export trait types
pub use traits::{CommittedRows, KeyedRow, RowProvider};
