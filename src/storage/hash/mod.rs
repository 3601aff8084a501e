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

//! Hash-indexed key/value storage
//!
//! - [`HashIndex`]: bucket heads plus chain links, owns the rehash policy
//! - [`KeyValueStore`]: key and value columns in one of three representations
//! - [`AccessManager`]: optional per-slot recency stamps
//! - [`BaseMap`]: put/get/remove/iterate over the three
//! - [`SharedMap`]: `BaseMap` behind a reader/writer lock

pub mod access;
pub mod hash_index;
pub mod map;
pub mod shared;
pub mod store;

pub use access::AccessManager;
pub use hash_index::{Chain, ChainLink, HashIndex};
pub use map::{BaseMap, Entry};
pub use shared::SharedMap;
pub use store::{Datum, KeyValueStore, SlotColumn};
