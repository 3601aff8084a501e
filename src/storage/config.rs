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

//! Construction-time configuration for maps and ordered indexes
//!

use smallvec::SmallVec;

use crate::core::{Error, Representation, Result};
use crate::storage::index::IndexColumn;

/// Default number of slots allocated by a new map
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Default load factor that triggers a rehash
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Largest slot count representable by the slot arrays
///
/// `u32::MAX` itself is reserved as the null link.
pub const MAX_SLOTS: usize = 1 << 31;

/// Configuration for a [`BaseMap`](crate::storage::hash::BaseMap)
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Representation of keys
    /// Default: Reference
    pub key: Representation,

    /// Representation of values, `None` for a set
    /// Default: Some(Reference)
    pub value: Option<Representation>,

    /// Requested initial slot count, rounded up to a power of two
    /// Default: 16
    pub initial_capacity: usize,

    /// Live entries / capacity ratio above which the table is rehashed
    /// Default: 0.75
    pub load_factor: f32,

    /// Whether to keep per-slot access counters
    /// Default: false
    pub track_access: bool,

    /// Hard limit on slot count; growing past it fails with CapacityExhausted
    /// Default: MAX_SLOTS
    pub max_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            key: Representation::Reference,
            value: Some(Representation::Reference),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            track_access: false,
            max_capacity: MAX_SLOTS,
        }
    }
}

impl MapConfig {
    /// Creates a map configuration with the given key and value representations
    pub fn new(key: Representation, value: Representation) -> Self {
        Self {
            key,
            value: Some(value),
            ..Default::default()
        }
    }

    /// Creates a set configuration (no value column)
    pub fn set(key: Representation) -> Self {
        Self {
            key,
            value: None,
            ..Default::default()
        }
    }

    /// Builder method to set the initial capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Builder method to set the load factor
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Builder method to enable/disable access tracking
    pub fn with_access_tracking(mut self, enabled: bool) -> Self {
        self.track_access = enabled;
        self
    }

    /// Builder method to set the capacity limit
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Returns true if this configures a set
    pub fn is_set(&self) -> bool {
        self.value.is_none()
    }

    /// Slot count the map starts with
    pub fn initial_slots(&self) -> usize {
        self.initial_capacity.max(1).next_power_of_two()
    }

    /// Checks the configuration for values the map cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::invalid_config(format!(
                "load factor must be in (0, 1], got {}",
                self.load_factor
            )));
        }
        if self.max_capacity == 0 || self.max_capacity > MAX_SLOTS {
            return Err(Error::invalid_config(format!(
                "max capacity must be in [1, {}], got {}",
                MAX_SLOTS, self.max_capacity
            )));
        }
        if self.initial_slots() > self.max_capacity {
            return Err(Error::invalid_config(format!(
                "initial capacity {} exceeds max capacity {}",
                self.initial_slots(),
                self.max_capacity
            )));
        }
        Ok(())
    }
}

/// Configuration for an [`OrderedIndex`](crate::storage::index::OrderedIndex)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index name, used in constraint errors
    pub name: String,

    /// Identifier assigned by the surrounding storage layer
    /// Default: 0
    pub persistence_id: i64,

    /// Comparator columns in significance order
    pub columns: SmallVec<[IndexColumn; 4]>,

    /// Whether equal keys are rejected
    /// Default: false
    pub unique: bool,

    /// Whether this is the table's primary key (implies unique)
    /// Default: false
    pub primary_key: bool,

    /// Whether the index backs a declared constraint
    /// Default: false
    pub constraint: bool,

    /// Whether the index backs a foreign key that references a table
    /// declared later
    /// Default: false
    pub forward: bool,
}

impl IndexConfig {
    /// Creates a non-unique index configuration with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persistence_id: 0,
            columns: SmallVec::new(),
            unique: false,
            primary_key: false,
            constraint: false,
            forward: false,
        }
    }

    /// Builder method to append a comparator column
    pub fn with_column(mut self, column: IndexColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Builder method to replace all comparator columns
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = IndexColumn>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Builder method to set the persistence id
    pub fn with_persistence_id(mut self, id: i64) -> Self {
        self.persistence_id = id;
        self
    }

    /// Builder method to make the index unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Builder method to make the index the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.constraint = true;
        self
    }

    /// Builder method to mark the index as backing a constraint
    pub fn constraint(mut self) -> Self {
        self.constraint = true;
        self
    }

    /// Builder method to mark a forward-referencing foreign key index
    pub fn forward(mut self) -> Self {
        self.forward = true;
        self.constraint = true;
        self
    }

    /// Checks the configuration for values the index cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::invalid_config(format!(
                "index {} has no columns",
                self.name
            )));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.position == col.position) {
                return Err(Error::invalid_config(format!(
                    "index {} repeats column {}",
                    self.name, col.position
                )));
            }
        }
        Ok(())
    }
}
