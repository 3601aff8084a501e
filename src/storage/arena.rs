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

//! Slot arena: fixed-growth backing arrays addressed by slot index
//!
//! Hash chain links and AVL tree nodes both live in a `SlotArena`. Records
//! reference each other by `Slot` rather than by pointer, with `NIL` as the
//! null link, so the arena (not the records) owns all memory and there is no
//! ownership cycle between parent and child nodes.
//!
//! Released slots go on a free list and are handed out again before the
//! arena's high-water mark advances. Growth copies the existing records and
//! default-fills the tail; records are never moved between slots.

use std::ops::{Index, IndexMut};

use crate::core::{Error, Result};

/// Index into an arena's parallel arrays
pub type Slot = u32;

/// Null link
pub const NIL: Slot = u32::MAX;

/// Flat array of fixed-size records with free-list reuse
#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    /// Record storage, `len() == capacity`
    entries: Vec<T>,
    /// Live marker per slot
    live: Vec<bool>,
    /// Released slots available for reuse
    free_list: Vec<Slot>,
    /// Slots below this mark have been handed out at least once
    high_water: usize,
    /// Number of live slots
    len: usize,
}

impl<T: Clone + Default> SlotArena<T> {
    /// Create an arena with `capacity` default-initialized slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![T::default(); capacity],
            live: vec![false; capacity],
            free_list: Vec::new(),
            high_water: 0,
            len: 0,
        }
    }

    /// Total slot count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of live slots
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if another slot can be allocated without growing
    #[inline]
    pub fn has_room(&self) -> bool {
        !self.free_list.is_empty() || self.high_water < self.entries.len()
    }

    /// Allocate a slot holding `value`
    ///
    /// Reuses released slots first. Returns `None` when the arena is full;
    /// the caller decides whether to grow.
    pub fn allocate(&mut self, value: T) -> Option<Slot> {
        let slot = match self.free_list.pop() {
            Some(slot) => slot,
            None if self.high_water < self.entries.len() => {
                let slot = self.high_water as Slot;
                self.high_water += 1;
                slot
            }
            None => return None,
        };

        let idx = slot as usize;
        self.entries[idx] = value;
        self.live[idx] = true;
        self.len += 1;
        Some(slot)
    }

    /// Release a live slot, returning its record
    ///
    /// Releasing a free or out-of-range slot is a no-op returning `None`.
    pub fn release(&mut self, slot: Slot) -> Option<T> {
        let idx = slot as usize;
        if !self.is_live(slot) {
            return None;
        }
        self.live[idx] = false;
        self.len -= 1;
        self.free_list.push(slot);
        Some(std::mem::take(&mut self.entries[idx]))
    }

    /// Returns true if `slot` holds a live record
    #[inline]
    pub fn is_live(&self, slot: Slot) -> bool {
        self.live.get(slot as usize).copied().unwrap_or(false)
    }

    /// Live record at `slot`
    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&T> {
        if self.is_live(slot) {
            Some(&self.entries[slot as usize])
        } else {
            None
        }
    }

    /// Mutable live record at `slot`
    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        if self.is_live(slot) {
            Some(&mut self.entries[slot as usize])
        } else {
            None
        }
    }

    /// Grow to `new_capacity` slots
    ///
    /// Either both arrays grow or neither does: storage is reserved up front
    /// and an allocation failure leaves the arena untouched.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.entries.len();
        if new_capacity <= current {
            return Ok(());
        }
        let additional = new_capacity - current;
        self.entries
            .try_reserve_exact(additional)
            .map_err(|_| Error::capacity_exhausted(new_capacity, current))?;
        self.live
            .try_reserve_exact(additional)
            .map_err(|_| Error::capacity_exhausted(new_capacity, current))?;

        self.entries.resize(new_capacity, T::default());
        self.live.resize(new_capacity, false);
        Ok(())
    }

    /// Release every slot; capacity is kept
    pub fn clear(&mut self) {
        for idx in 0..self.high_water {
            self.entries[idx] = T::default();
            self.live[idx] = false;
        }
        self.free_list.clear();
        self.high_water = 0;
        self.len = 0;
    }

    /// Live slots in slot-array order
    pub fn live_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.high_water)
            .filter(move |&idx| self.live[idx])
            .map(|idx| idx as Slot)
    }
}

impl<T> Index<Slot> for SlotArena<T> {
    type Output = T;

    #[inline]
    fn index(&self, slot: Slot) -> &Self::Output {
        &self.entries[slot as usize]
    }
}

impl<T> IndexMut<Slot> for SlotArena<T> {
    #[inline]
    fn index_mut(&mut self, slot: Slot) -> &mut Self::Output {
        &mut self.entries[slot as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_until_full() {
        let mut arena: SlotArena<u64> = SlotArena::with_capacity(2);
        assert_eq!(arena.allocate(10), Some(0));
        assert_eq!(arena.allocate(11), Some(1));
        assert_eq!(arena.allocate(12), None);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[1], 11);
    }

    #[test]
    fn test_release_and_reuse() {
        let mut arena: SlotArena<u64> = SlotArena::with_capacity(4);
        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(2).unwrap();
        assert_eq!(arena.release(a), Some(1));
        assert!(!arena.is_live(a));
        assert_eq!(arena.get(a), None);

        // Released slot comes back before the high-water mark advances
        assert_eq!(arena.allocate(3), Some(a));
        assert_eq!(arena.get(b), Some(&2));

        // Double release is a no-op
        assert_eq!(arena.release(b), Some(2));
        assert_eq!(arena.release(b), None);
        assert_eq!(arena.release(NIL), None);
    }

    #[test]
    fn test_grow_keeps_records_in_place() {
        let mut arena: SlotArena<u64> = SlotArena::with_capacity(2);
        arena.allocate(7).unwrap();
        arena.allocate(8).unwrap();
        arena.grow(8).unwrap();

        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena[0], 7);
        assert_eq!(arena[1], 8);
        assert_eq!(arena[5], 0);
        assert_eq!(arena.allocate(9), Some(2));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut arena: SlotArena<u64> = SlotArena::with_capacity(4);
        for i in 0..4 {
            arena.allocate(i).unwrap();
        }
        arena.release(2);
        arena.clear();

        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 4);
        assert_eq!(arena.live_slots().count(), 0);
        assert_eq!(arena.allocate(5), Some(0));
    }

    #[test]
    fn test_live_slots_order() {
        let mut arena: SlotArena<u64> = SlotArena::with_capacity(5);
        for i in 0..5 {
            arena.allocate(i).unwrap();
        }
        arena.release(1);
        arena.release(3);
        let live: Vec<Slot> = arena.live_slots().collect();
        assert_eq!(live, vec![0, 2, 4]);
    }
}
