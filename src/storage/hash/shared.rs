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

//! Thread-safe map wrapper
//!
//! One `parking_lot::RwLock` per map. Lookups share the read lock (access
//! counters are atomic), every structural change takes the write lock, so a
//! rehash is never observed half done.

use std::hash::{BuildHasher, Hash};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::common::hashing::FxBuildHasher;
use crate::core::Result;
use crate::storage::config::MapConfig;

use super::map::{BaseMap, Entry};
use super::store::Datum;

/// `BaseMap` behind a reader/writer latch
pub struct SharedMap<K, V = K, S = FxBuildHasher> {
    inner: RwLock<BaseMap<K, V, S>>,
}

impl<K, V> SharedMap<K, V, FxBuildHasher>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(config: MapConfig) -> Result<Self> {
        Ok(Self::from_map(BaseMap::new(config)?))
    }
}

impl<K, V, S> SharedMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Wrap an existing map
    pub fn from_map(map: BaseMap<K, V, S>) -> Self {
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn put(&self, key: Datum<K>, value: Datum<V>) -> Result<Option<Datum<V>>> {
        self.inner.write().put(key, value)
    }

    pub fn add(&self, key: Datum<K>) -> Result<bool> {
        self.inner.write().add(key)
    }

    pub fn get(&self, key: &Datum<K>) -> Option<Datum<V>> {
        self.inner.read().get(key)
    }

    pub fn contains_key(&self, key: &Datum<K>) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn remove(&self, key: &Datum<K>) -> Option<Datum<V>> {
        self.inner.write().remove(key)
    }

    pub fn discard(&self, key: &Datum<K>) -> bool {
        self.inner.write().discard(key)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn rehash_count(&self) -> u64 {
        self.inner.read().rehash_count()
    }

    /// Copy every entry out under one read-lock hold
    ///
    /// This is the safe way to iterate while other threads write.
    pub fn snapshot(&self) -> Vec<Entry<K, V>> {
        self.inner.read().snapshot()
    }

    /// Shared guard for zero-copy iteration; writers block until it drops
    pub fn read(&self) -> RwLockReadGuard<'_, BaseMap<K, V, S>> {
        self.inner.read()
    }

    /// Unwrap the map
    pub fn into_inner(self) -> BaseMap<K, V, S> {
        self.inner.into_inner()
    }
}
