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

//! Ordered indexes
//!
//! - [`Comparator`] / [`IndexColumn`]: multi-column ordering with per-column
//!   direction and NULL placement
//! - [`AvlTree`]: balanced tree of row handles in a slot arena
//! - [`OrderedIndex`]: comparator + tree + row provider behind a lock
//! - [`IndexScan`] / [`ScanCursor`]: lazy, visibility-filtered, resumable scans

pub mod avl;
pub mod comparator;
pub mod ordered;
pub mod scan;

pub use avl::{AvlNode, AvlTree, InsertPoint, Side, TreeStats};
pub use comparator::{Comparator, IndexColumn};
pub use ordered::{IndexMetadata, OrderedIndex};
pub use scan::{IndexScan, RawScan, ScanBound, ScanCursor};
