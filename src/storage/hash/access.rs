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

//! Per-slot access recency counters
//!
//! Every successful get or put stamps the slot with the next value of a
//! map-wide clock. Counters are atomics so that reads can record access
//! while holding only a shared borrow (or a read lock in `SharedMap`).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{Error, Result};
use crate::storage::arena::Slot;

/// Access clock plus one counter per slot
#[derive(Debug)]
pub struct AccessManager {
    counters: Vec<AtomicU64>,
    clock: AtomicU64,
}

impl AccessManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            counters: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
            clock: AtomicU64::new(0),
        }
    }

    /// Record an access to `slot`, returning its new stamp
    #[inline]
    pub fn touch(&self, slot: Slot) -> u64 {
        let stamp = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        self.counters[slot as usize].store(stamp, Ordering::Relaxed);
        stamp
    }

    /// Stamp of the last access to `slot`, 0 if never accessed
    #[inline]
    pub fn count(&self, slot: Slot) -> u64 {
        self.counters[slot as usize].load(Ordering::Relaxed)
    }

    /// Forget the history of a freed slot
    #[inline]
    pub fn reset(&self, slot: Slot) {
        self.counters[slot as usize].store(0, Ordering::Relaxed);
    }

    /// Current clock value (the most recent stamp handed out)
    pub fn clock(&self) -> u64 {
        self.clock.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.counters.len()
    }

    /// Extend to `new_capacity` counters; existing stamps are kept
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.counters.len();
        if new_capacity <= current {
            return Ok(());
        }
        self.counters
            .try_reserve_exact(new_capacity - current)
            .map_err(|_| Error::capacity_exhausted(new_capacity, current))?;
        self.counters
            .extend((current..new_capacity).map(|_| AtomicU64::new(0)));
        Ok(())
    }

    /// Zero every counter; the clock keeps running
    pub fn clear(&mut self) {
        for counter in &mut self.counters {
            *counter.get_mut() = 0;
        }
    }

    /// Raw counters in slot order
    pub fn snapshot(&self) -> Vec<u64> {
        self.counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }
}
