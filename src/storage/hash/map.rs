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

//! Hash-indexed key/value map over slot columns
//!
//! `BaseMap` composes a [`HashIndex`] (bucket heads and chains), a
//! [`KeyValueStore`] (key and value columns) and an optional
//! [`AccessManager`]. All three are addressed by the same slot and grow
//! together.
//!
//! Absent keys are reported with `None`. The only runtime error is capacity
//! exhaustion; representation errors signal a caller bug.
//!
//! # Iteration
//!
//! [`BaseMap::iter`] walks live slots in slot-array order. The borrow checker
//! forbids mutating the map while an iterator is alive; for `SharedMap` take
//! a [`snapshot`](super::SharedMap::snapshot) or hold the read guard.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::common::hashing::{hash_i32, hash_i64, hash_reference, FxBuildHasher};
use crate::core::{Error, Representation, Result};
use crate::storage::arena::Slot;
use crate::storage::config::MapConfig;

use super::access::AccessManager;
use super::hash_index::HashIndex;
use super::store::{Datum, KeyValueStore};

/// A key with its value; the value is `None` for sets
pub type Entry<K, V> = (Datum<K>, Option<Datum<V>>);

/// Hash map (or set) with fixed key and value representations
pub struct BaseMap<K, V = K, S = FxBuildHasher> {
    config: MapConfig,
    index: HashIndex,
    store: KeyValueStore<K, V>,
    access: Option<AccessManager>,
    hasher: S,
}

impl<K, V> BaseMap<K, V, FxBuildHasher>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a map hashing reference keys with `FxBuildHasher`
    pub fn new(config: MapConfig) -> Result<Self> {
        Self::with_hasher(config, FxBuildHasher)
    }
}

impl<K, V, S> BaseMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Create a map hashing reference keys with `hasher`
    ///
    /// Integer keys always use the built-in integer scrambler.
    pub fn with_hasher(config: MapConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        let capacity = config.initial_slots();
        Ok(Self {
            index: HashIndex::new(capacity, config.load_factor, config.max_capacity),
            store: KeyValueStore::new(config.key, config.value, capacity),
            access: config.track_access.then(|| AccessManager::new(capacity)),
            hasher,
            config,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current slot capacity
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Live entries / capacity
    pub fn load_factor(&self) -> f32 {
        self.index.load_factor()
    }

    /// Number of rehashes since construction
    pub fn rehash_count(&self) -> u64 {
        self.index.rehash_count()
    }

    pub fn key_representation(&self) -> Representation {
        self.store.key_representation()
    }

    pub fn value_representation(&self) -> Option<Representation> {
        self.store.value_representation()
    }

    /// Returns true if this map has no value column
    pub fn is_set(&self) -> bool {
        self.store.is_set()
    }

    #[inline]
    fn hash_key(&self, key: &Datum<K>) -> u64 {
        match key {
            Datum::Ref(r) => hash_reference(&self.hasher, r),
            Datum::Int(v) => hash_i32(*v),
            Datum::Long(v) => hash_i64(*v),
        }
    }

    /// Slot holding `key`, if any
    fn find_slot(&self, key: &Datum<K>) -> Option<Slot> {
        if key.representation() != self.store.key_representation() {
            return None;
        }
        let hash = self.hash_key(key);
        self.index
            .chain(hash)
            .find(|&slot| self.store.key_matches(slot, key))
    }

    /// Allocate a slot for a new key, growing every column first if needed
    fn allocate_slot(&mut self, hash: u64) -> Result<Slot> {
        if let Some(next) = self.index.pending_growth() {
            if next <= self.config.max_capacity {
                self.store.grow(next)?;
                if let Some(access) = &mut self.access {
                    access.grow(next)?;
                }
            }
        }
        self.index.insert_new_key(hash)
    }

    #[inline]
    fn touch(&self, slot: Slot) {
        if let Some(access) = &self.access {
            access.touch(slot);
        }
    }

    /// Insert or overwrite, returning the previous value
    ///
    /// Fails with `MissingValueColumn` on a set, `RepresentationMismatch`
    /// when `key` or `value` does not match the configuration, and
    /// `CapacityExhausted` when the table cannot grow. The map is unchanged
    /// on error.
    pub fn put(&mut self, key: Datum<K>, value: Datum<V>) -> Result<Option<Datum<V>>> {
        self.store.check_value(&value)?;
        self.store.check_key(&key)?;

        if let Some(slot) = self.find_slot(&key) {
            let previous = self.store.store_value(slot, value);
            self.touch(slot);
            return Ok(previous);
        }

        let hash = self.hash_key(&key);
        let slot = self.allocate_slot(hash)?;
        self.store.store_key(slot, key);
        self.store.store_value(slot, value);
        self.touch(slot);
        Ok(None)
    }

    /// Add `key` to a set, returning true if it was not already present
    ///
    /// On a map with a value column the new slot keeps the column's empty
    /// value (`None` for references, zero for integers).
    pub fn add(&mut self, key: Datum<K>) -> Result<bool> {
        self.store.check_key(&key)?;
        if let Some(slot) = self.find_slot(&key) {
            self.touch(slot);
            return Ok(false);
        }
        let hash = self.hash_key(&key);
        let slot = self.allocate_slot(hash)?;
        self.store.store_key(slot, key);
        self.touch(slot);
        Ok(true)
    }

    /// Value stored for `key`
    pub fn get(&self, key: &Datum<K>) -> Option<Datum<V>> {
        let slot = self.find_slot(key)?;
        self.touch(slot);
        self.store.read_value(slot)
    }

    pub fn contains_key(&self, key: &Datum<K>) -> bool {
        self.find_slot(key).is_some()
    }

    /// Set-flavored alias of [`contains_key`](Self::contains_key)
    #[inline]
    pub fn contains(&self, key: &Datum<K>) -> bool {
        self.contains_key(key)
    }

    /// Remove `key`, returning its stored key and value
    pub fn remove_entry(&mut self, key: &Datum<K>) -> Option<Entry<K, V>> {
        let slot = self.find_slot(key)?;
        let hash = self.index.hash_of(slot);
        if !self.index.remove_slot(hash, slot) {
            return None;
        }
        if let Some(access) = &self.access {
            access.reset(slot);
        }
        let (stored_key, value) = self.store.clear_slot(slot);
        stored_key.map(|k| (k, value))
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &Datum<K>) -> Option<Datum<V>> {
        self.remove_entry(key).and_then(|(_, value)| value)
    }

    /// Remove `key` from a set, returning true if it was present
    pub fn discard(&mut self, key: &Datum<K>) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Remove everything; capacity is kept
    pub fn clear(&mut self) {
        self.index.clear();
        self.store.clear();
        if let Some(access) = &mut self.access {
            access.clear();
        }
    }

    /// Live entries in slot-array order
    pub fn iter(&self) -> impl Iterator<Item = Entry<K, V>> + '_ {
        self.index.live_slots().filter_map(move |slot| {
            let key = self.store.read_key(slot)?;
            Some((key, self.store.read_value(slot)))
        })
    }

    /// Live keys in slot-array order
    pub fn keys(&self) -> impl Iterator<Item = Datum<K>> + '_ {
        self.index
            .live_slots()
            .filter_map(move |slot| self.store.read_key(slot))
    }

    /// Live values in slot-array order
    pub fn values(&self) -> impl Iterator<Item = Datum<V>> + '_ {
        self.index
            .live_slots()
            .filter_map(move |slot| self.store.read_value(slot))
    }

    /// Owned copy of every entry
    pub fn snapshot(&self) -> Vec<Entry<K, V>> {
        self.iter().collect()
    }

    /// Whether access counters are kept
    pub fn tracks_access(&self) -> bool {
        self.access.is_some()
    }

    /// Stamp of the last get/put on `key`; `None` if absent or untracked
    pub fn access_count(&self, key: &Datum<K>) -> Option<u64> {
        let access = self.access.as_ref()?;
        let slot = self.find_slot(key)?;
        Some(access.count(slot))
    }

    /// Raw access counters in slot order
    pub fn access_counters(&self) -> Option<Vec<u64>> {
        self.access.as_ref().map(AccessManager::snapshot)
    }

    /// Live key with the oldest access stamp
    pub fn least_recently_used(&self) -> Option<Datum<K>> {
        let access = self.access.as_ref()?;
        let slot = self
            .index
            .live_slots()
            .min_by_key(|&slot| access.count(slot))?;
        self.store.read_key(slot)
    }

    /// Check chain structure and that every live slot holds a key
    pub fn verify(&self) -> Result<()> {
        self.index.verify()?;
        for slot in self.index.live_slots() {
            let key = self.store.read_key(slot).ok_or_else(|| {
                Error::internal(format!("live slot {} has no key", slot))
            })?;
            if self.hash_key(&key) != self.index.hash_of(slot) {
                return Err(Error::internal(format!(
                    "slot {} cached hash does not match its key",
                    slot
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for BaseMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseMap")
            .field("key", &self.config.key)
            .field("value", &self.config.value)
            .field("len", &self.index.len())
            .field("capacity", &self.index.capacity())
            .field("rehash_count", &self.index.rehash_count())
            .finish()
    }
}
