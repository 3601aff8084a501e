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

//! Open hash table of bucket heads plus a chain-link arena
//!
//! `buckets[hash & mask]` holds the first slot of a chain and each slot's link
//! holds the next slot in the same bucket (or `NIL`). The index only hands out
//! slots; the key/value store decides what lives in them.
//!
//! Each link caches the full hash of its key so that chains can be filtered
//! without touching the key arrays and so that a rehash never needs to rehash
//! keys.

use tracing::{debug, warn};

use crate::common::hashing::bucket_of;
use crate::core::{Error, Result};
use crate::storage::arena::{Slot, SlotArena, NIL};

/// Chain link stored per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    /// Next slot in the same bucket
    pub next: Slot,
    /// Full hash of the key stored in this slot
    pub hash: u64,
}

impl Default for ChainLink {
    fn default() -> Self {
        Self { next: NIL, hash: 0 }
    }
}

/// Bucket array plus chain links with doubling rehash policy
#[derive(Debug, Clone)]
pub struct HashIndex {
    /// Chain head per bucket, `len()` is a power of two
    buckets: Vec<Slot>,
    /// Chain links, capacity always equals the bucket count
    links: SlotArena<ChainLink>,
    load_factor: f32,
    /// Largest live count allowed at the current capacity
    threshold: usize,
    max_capacity: usize,
    rehash_count: u64,
}

impl HashIndex {
    /// Create an index with `capacity` buckets
    ///
    /// `capacity` must be a power of two no larger than `max_capacity`.
    pub fn new(capacity: usize, load_factor: f32, max_capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(capacity <= max_capacity);
        Self {
            buckets: vec![NIL; capacity],
            links: SlotArena::with_capacity(capacity),
            load_factor,
            threshold: threshold_for(capacity, load_factor),
            max_capacity,
            rehash_count: 0,
        }
    }

    /// Number of buckets (and slots)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of live slots
    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Live count above which the next insert rehashes
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of completed rehashes since construction
    #[inline]
    pub fn rehash_count(&self) -> u64 {
        self.rehash_count
    }

    /// Current live entries / capacity ratio
    pub fn load_factor(&self) -> f32 {
        self.links.len() as f32 / self.buckets.len() as f32
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.buckets.len() - 1
    }

    /// First slot of the chain `hash` falls into, or `NIL`
    #[inline]
    pub fn lookup(&self, hash: u64) -> Slot {
        self.buckets[bucket_of(hash, self.mask())]
    }

    /// Next slot in the same chain, or `NIL`
    #[inline]
    pub fn next(&self, slot: Slot) -> Slot {
        self.links[slot].next
    }

    /// Cached hash of the key held by `slot`
    #[inline]
    pub fn hash_of(&self, slot: Slot) -> u64 {
        self.links[slot].hash
    }

    /// Returns true if `slot` is live
    #[inline]
    pub fn is_live(&self, slot: Slot) -> bool {
        self.links.is_live(slot)
    }

    /// Slots in the bucket of `hash` whose cached hash equals `hash`
    pub fn chain(&self, hash: u64) -> Chain<'_> {
        Chain {
            index: self,
            current: self.lookup(hash),
            hash,
        }
    }

    /// Capacity the next `insert_new_key` will rehash to, if it rehashes
    ///
    /// Lets the owner grow its parallel arrays before the index commits to a
    /// larger table.
    pub fn pending_growth(&self) -> Option<usize> {
        if self.links.len() + 1 > self.threshold || !self.links.has_room() {
            Some(self.capacity().saturating_mul(2))
        } else {
            None
        }
    }

    /// Allocate a slot for a new key with `hash` and link it into its chain
    ///
    /// Rehashes first when the insert would push the live count past the
    /// threshold. On error nothing has changed.
    pub fn insert_new_key(&mut self, hash: u64) -> Result<Slot> {
        if let Some(next_capacity) = self.pending_growth() {
            self.rehash(next_capacity)?;
        }

        let bucket = bucket_of(hash, self.mask());
        let head = self.buckets[bucket];
        let slot = self
            .links
            .allocate(ChainLink { next: head, hash })
            .ok_or_else(|| Error::internal("hash index has no free slot after rehash"))?;
        self.buckets[bucket] = slot;
        Ok(slot)
    }

    /// Unlink `slot` from the chain of `hash` and free it
    ///
    /// Returns false (and changes nothing) when the slot is not in that chain.
    pub fn remove_slot(&mut self, hash: u64, slot: Slot) -> bool {
        let bucket = bucket_of(hash, self.mask());
        let mut prev = NIL;
        let mut current = self.buckets[bucket];

        while current != NIL {
            let next = self.links[current].next;
            if current == slot {
                if prev == NIL {
                    self.buckets[bucket] = next;
                } else {
                    self.links[prev].next = next;
                }
                self.links.release(slot);
                return true;
            }
            prev = current;
            current = next;
        }
        false
    }

    /// Empty every chain; capacity is kept
    pub fn clear(&mut self) {
        self.buckets.fill(NIL);
        self.links.clear();
    }

    /// Live slots in slot-array order
    pub fn live_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.links.live_slots()
    }

    /// Rebuild the bucket array at `new_capacity` and relink every live slot
    ///
    /// All fallible allocation happens before the old structure is modified.
    fn rehash(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity > self.max_capacity {
            warn!(
                requested = new_capacity,
                limit = self.max_capacity,
                live = self.links.len(),
                "hash index capacity exhausted"
            );
            return Err(Error::capacity_exhausted(new_capacity, self.max_capacity));
        }

        let mut new_buckets: Vec<Slot> = Vec::new();
        new_buckets
            .try_reserve_exact(new_capacity)
            .map_err(|_| Error::capacity_exhausted(new_capacity, self.capacity()))?;
        new_buckets.resize(new_capacity, NIL);
        self.links.grow(new_capacity)?;

        let new_mask = new_capacity - 1;
        for bucket in 0..self.buckets.len() {
            let mut current = self.buckets[bucket];
            while current != NIL {
                let link = self.links[current];
                let target = bucket_of(link.hash, new_mask);
                self.links[current].next = new_buckets[target];
                new_buckets[target] = current;
                current = link.next;
            }
        }

        let old_capacity = self.buckets.len();
        self.buckets = new_buckets;
        self.threshold = threshold_for(new_capacity, self.load_factor);
        self.rehash_count += 1;

        debug!(
            old_capacity,
            new_capacity,
            live = self.links.len(),
            "hash index rehashed"
        );
        Ok(())
    }

    /// Walk every chain and check that each live slot is reachable exactly
    /// once from the bucket its hash maps to
    pub fn verify(&self) -> Result<()> {
        let mask = self.mask();
        let mut seen = 0usize;
        for (bucket, &head) in self.buckets.iter().enumerate() {
            let mut current = head;
            while current != NIL {
                if !self.links.is_live(current) {
                    return Err(Error::internal(format!(
                        "bucket {} links to free slot {}",
                        bucket, current
                    )));
                }
                if bucket_of(self.links[current].hash, mask) != bucket {
                    return Err(Error::internal(format!(
                        "slot {} chained into wrong bucket {}",
                        current, bucket
                    )));
                }
                seen += 1;
                if seen > self.links.len() {
                    return Err(Error::internal("hash chain cycle detected"));
                }
                current = self.links[current].next;
            }
        }
        if seen != self.links.len() {
            return Err(Error::internal(format!(
                "{} live slots but {} reachable",
                self.links.len(),
                seen
            )));
        }
        Ok(())
    }
}

/// Live-count limit for a table of `capacity` slots
fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    ((capacity as f64 * load_factor as f64).floor() as usize).clamp(1, capacity)
}

/// Iterator over the candidate slots for one hash
pub struct Chain<'a> {
    index: &'a HashIndex,
    current: Slot,
    hash: u64,
}

impl Iterator for Chain<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        while self.current != NIL {
            let slot = self.current;
            let link = self.index.links[slot];
            self.current = link.next;
            if link.hash == self.hash {
                return Some(slot);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::hashing::hash_i64;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = HashIndex::new(8, 0.75, 1 << 20);
        let h = hash_i64(42);
        assert_eq!(index.lookup(h), NIL);

        let slot = index.insert_new_key(h).unwrap();
        assert_eq!(index.chain(h).collect::<Vec<_>>(), vec![slot]);
        assert_eq!(index.hash_of(slot), h);
        assert_eq!(index.len(), 1);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_threshold_triggers_one_rehash() {
        let mut index = HashIndex::new(4, 0.75, 1 << 20);
        assert_eq!(index.threshold(), 3);
        for k in 0..3 {
            index.insert_new_key(hash_i64(k)).unwrap();
        }
        assert_eq!(index.rehash_count(), 0);
        assert_eq!(index.capacity(), 4);

        index.insert_new_key(hash_i64(3)).unwrap();
        assert_eq!(index.rehash_count(), 1);
        assert_eq!(index.capacity(), 8);
        assert_eq!(index.threshold(), 6);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_pending_growth() {
        let mut index = HashIndex::new(4, 0.75, 1 << 20);
        assert_eq!(index.pending_growth(), None);
        for k in 0..3 {
            index.insert_new_key(hash_i64(k)).unwrap();
        }
        assert_eq!(index.pending_growth(), Some(8));
    }

    #[test]
    fn test_remove_slot_middle_of_chain() {
        // Same hash puts all three slots in one chain
        let mut index = HashIndex::new(16, 0.75, 1 << 20);
        let h = hash_i64(7);
        let a = index.insert_new_key(h).unwrap();
        let b = index.insert_new_key(h).unwrap();
        let c = index.insert_new_key(h).unwrap();

        assert!(index.remove_slot(h, b));
        let chain: Vec<Slot> = index.chain(h).collect();
        assert_eq!(chain, vec![c, a]);
        assert!(!index.remove_slot(h, b));
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut index = HashIndex::new(8, 0.75, 1 << 20);
        assert!(!index.remove_slot(hash_i64(1), 3));
        assert!(!index.remove_slot(hash_i64(1), NIL));
        assert!(index.is_empty());
    }

    #[test]
    fn test_freed_slot_reused() {
        let mut index = HashIndex::new(8, 0.75, 1 << 20);
        let a = index.insert_new_key(hash_i64(1)).unwrap();
        index.insert_new_key(hash_i64(2)).unwrap();
        assert!(index.remove_slot(hash_i64(1), a));
        let again = index.insert_new_key(hash_i64(3)).unwrap();
        assert_eq!(again, a);
    }

    #[test]
    fn test_capacity_exhausted_leaves_index_intact() {
        let mut index = HashIndex::new(4, 0.75, 4);
        for k in 0..3 {
            index.insert_new_key(hash_i64(k)).unwrap();
        }
        let err = index.insert_new_key(hash_i64(99)).unwrap_err();
        assert!(err.is_capacity_error());
        assert_eq!(index.len(), 3);
        assert_eq!(index.capacity(), 4);
        assert_eq!(index.rehash_count(), 0);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut index = HashIndex::new(4, 0.75, 1 << 20);
        for k in 0..10 {
            index.insert_new_key(hash_i64(k)).unwrap();
        }
        let capacity = index.capacity();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.capacity(), capacity);
        assert_eq!(index.lookup(hash_i64(3)), NIL);
    }

    #[test]
    fn test_full_load_factor() {
        let mut index = HashIndex::new(2, 1.0, 1 << 20);
        index.insert_new_key(hash_i64(1)).unwrap();
        index.insert_new_key(hash_i64(2)).unwrap();
        assert_eq!(index.capacity(), 2);
        index.insert_new_key(hash_i64(3)).unwrap();
        assert_eq!(index.capacity(), 4);
        assert!(index.verify().is_ok());
    }
}
