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

//! Key and value columns with three fixed representations
//!
//! A column is one of `Reference`, `Int32` or `Int64` for its whole life. The
//! variant is picked from the map configuration at construction, so a store
//! or read is a single match on an enum that never changes.

use std::fmt;

use crate::core::{Error, Representation, Result};
use crate::storage::arena::Slot;

/// One key or value in one of the three representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datum<R> {
    /// Opaque reference compared with `Eq` and hashed with the map's hasher
    Ref(R),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
}

impl<R> Datum<R> {
    /// Representation this datum is written in
    #[inline]
    pub fn representation(&self) -> Representation {
        match self {
            Datum::Ref(_) => Representation::Reference,
            Datum::Int(_) => Representation::Int32,
            Datum::Long(_) => Representation::Int64,
        }
    }

    pub fn as_reference(&self) -> Option<&R> {
        match self {
            Datum::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Datum::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Datum::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Unwrap a reference datum
    pub fn into_ref(self) -> Option<R> {
        match self {
            Datum::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl<R: fmt::Display> fmt::Display for Datum<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Ref(r) => write!(f, "{}", r),
            Datum::Int(v) => write!(f, "{}", v),
            Datum::Long(v) => write!(f, "{}", v),
        }
    }
}

/// A slot-indexed column in a fixed representation
#[derive(Debug, Clone)]
pub enum SlotColumn<R> {
    Reference(Vec<Option<R>>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
}

impl<R: Clone> SlotColumn<R> {
    /// Create a column of `capacity` empty slots
    pub fn new(representation: Representation, capacity: usize) -> Self {
        match representation {
            Representation::Reference => SlotColumn::Reference(vec![None; capacity]),
            Representation::Int32 => SlotColumn::Int32(vec![0; capacity]),
            Representation::Int64 => SlotColumn::Int64(vec![0; capacity]),
        }
    }

    pub fn representation(&self) -> Representation {
        match self {
            SlotColumn::Reference(_) => Representation::Reference,
            SlotColumn::Int32(_) => Representation::Int32,
            SlotColumn::Int64(_) => Representation::Int64,
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        match self {
            SlotColumn::Reference(v) => v.len(),
            SlotColumn::Int32(v) => v.len(),
            SlotColumn::Int64(v) => v.len(),
        }
    }

    /// Extend to `new_capacity` slots, zero-filling the tail
    ///
    /// Existing slots keep their position. A smaller capacity is a no-op.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let current = self.capacity();
        if new_capacity <= current {
            return Ok(());
        }
        let additional = new_capacity - current;
        let failed = |_| Error::capacity_exhausted(new_capacity, current);
        match self {
            SlotColumn::Reference(v) => {
                v.try_reserve_exact(additional).map_err(failed)?;
                v.resize(new_capacity, None);
            }
            SlotColumn::Int32(v) => {
                v.try_reserve_exact(additional).map_err(failed)?;
                v.resize(new_capacity, 0);
            }
            SlotColumn::Int64(v) => {
                v.try_reserve_exact(additional).map_err(failed)?;
                v.resize(new_capacity, 0);
            }
        }
        Ok(())
    }

    /// Check that `datum` can be written to this column
    pub fn accepts(&self, datum: &Datum<R>, role: &'static str) -> Result<()> {
        let expected = self.representation();
        let got = datum.representation();
        if expected == got {
            Ok(())
        } else {
            Err(Error::representation_mismatch(role, expected, got))
        }
    }

    /// Write `datum` into `slot`, returning what was there
    ///
    /// The caller checks the representation first with [`accepts`](Self::accepts);
    /// a mismatched datum is dropped and `None` is returned.
    pub fn store(&mut self, slot: Slot, datum: Datum<R>) -> Option<Datum<R>> {
        let i = slot as usize;
        match (self, datum) {
            (SlotColumn::Reference(v), Datum::Ref(r)) => v[i].replace(r).map(Datum::Ref),
            (SlotColumn::Int32(v), Datum::Int(x)) => {
                Some(Datum::Int(std::mem::replace(&mut v[i], x)))
            }
            (SlotColumn::Int64(v), Datum::Long(x)) => {
                Some(Datum::Long(std::mem::replace(&mut v[i], x)))
            }
            _ => {
                debug_assert!(false, "datum representation not checked before store");
                None
            }
        }
    }

    /// Read the datum held by `slot`
    pub fn read(&self, slot: Slot) -> Option<Datum<R>> {
        let i = slot as usize;
        match self {
            SlotColumn::Reference(v) => v[i].clone().map(Datum::Ref),
            SlotColumn::Int32(v) => Some(Datum::Int(v[i])),
            SlotColumn::Int64(v) => Some(Datum::Long(v[i])),
        }
    }

    /// Reset `slot` to empty, returning its previous datum
    pub fn take(&mut self, slot: Slot) -> Option<Datum<R>> {
        let i = slot as usize;
        match self {
            SlotColumn::Reference(v) => v[i].take().map(Datum::Ref),
            SlotColumn::Int32(v) => Some(Datum::Int(std::mem::take(&mut v[i]))),
            SlotColumn::Int64(v) => Some(Datum::Long(std::mem::take(&mut v[i]))),
        }
    }

    /// Reset every slot; capacity is kept
    pub fn clear(&mut self) {
        match self {
            SlotColumn::Reference(v) => v.fill(None),
            SlotColumn::Int32(v) => v.fill(0),
            SlotColumn::Int64(v) => v.fill(0),
        }
    }
}

impl<R: PartialEq> SlotColumn<R> {
    /// Returns true if `slot` holds a datum equal to `datum`
    #[inline]
    pub fn matches(&self, slot: Slot, datum: &Datum<R>) -> bool {
        let i = slot as usize;
        match (self, datum) {
            (SlotColumn::Reference(v), Datum::Ref(r)) => v[i].as_ref() == Some(r),
            (SlotColumn::Int32(v), Datum::Int(x)) => v[i] == *x,
            (SlotColumn::Int64(v), Datum::Long(x)) => v[i] == *x,
            _ => false,
        }
    }
}

/// Parallel key and value columns addressed by slot
///
/// A set has no value column.
#[derive(Debug, Clone)]
pub struct KeyValueStore<K, V> {
    keys: SlotColumn<K>,
    values: Option<SlotColumn<V>>,
}

impl<K: Clone + PartialEq, V: Clone> KeyValueStore<K, V> {
    pub fn new(key: Representation, value: Option<Representation>, capacity: usize) -> Self {
        Self {
            keys: SlotColumn::new(key, capacity),
            values: value.map(|r| SlotColumn::new(r, capacity)),
        }
    }

    pub fn key_representation(&self) -> Representation {
        self.keys.representation()
    }

    pub fn value_representation(&self) -> Option<Representation> {
        self.values.as_ref().map(SlotColumn::representation)
    }

    /// Returns true if this store has no value column
    pub fn is_set(&self) -> bool {
        self.values.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    /// Grow both columns together; on error neither has changed length
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        if let Some(values) = &mut self.values {
            // Values first: a failed key grow then leaves only spare value slots
            values.grow(new_capacity)?;
        }
        self.keys.grow(new_capacity)
    }

    /// Check a key before it is used for storage
    pub fn check_key(&self, key: &Datum<K>) -> Result<()> {
        self.keys.accepts(key, "key")
    }

    /// Check a value before it is used for storage
    pub fn check_value(&self, value: &Datum<V>) -> Result<()> {
        match &self.values {
            Some(values) => values.accepts(value, "value"),
            None => Err(Error::MissingValueColumn),
        }
    }

    pub fn store_key(&mut self, slot: Slot, key: Datum<K>) {
        self.keys.store(slot, key);
    }

    /// Write the value for `slot`, returning the previous value
    pub fn store_value(&mut self, slot: Slot, value: Datum<V>) -> Option<Datum<V>> {
        self.values.as_mut().and_then(|v| v.store(slot, value))
    }

    pub fn read_key(&self, slot: Slot) -> Option<Datum<K>> {
        self.keys.read(slot)
    }

    pub fn read_value(&self, slot: Slot) -> Option<Datum<V>> {
        self.values.as_ref().and_then(|v| v.read(slot))
    }

    #[inline]
    pub fn key_matches(&self, slot: Slot, key: &Datum<K>) -> bool {
        self.keys.matches(slot, key)
    }

    /// Empty `slot`, returning its key and value
    pub fn clear_slot(&mut self, slot: Slot) -> (Option<Datum<K>>, Option<Datum<V>>) {
        let key = self.keys.take(slot);
        let value = self.values.as_mut().and_then(|v| v.take(slot));
        (key, value)
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.keys.clear();
        if let Some(values) = &mut self.values {
            values.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_representation() {
        assert_eq!(Datum::<String>::Int(1).representation(), Representation::Int32);
        assert_eq!(Datum::<String>::Long(1).representation(), Representation::Int64);
        assert_eq!(
            Datum::Ref("a".to_string()).representation(),
            Representation::Reference
        );
        assert_eq!(Datum::<String>::Long(7).as_long(), Some(7));
        assert_eq!(Datum::<String>::Long(7).as_int(), None);
        assert_eq!(Datum::Ref("x").to_string(), "x");
    }

    #[test]
    fn test_column_store_and_read() {
        let mut col: SlotColumn<String> = SlotColumn::new(Representation::Reference, 4);
        assert_eq!(col.read(2), None);
        assert_eq!(col.store(2, Datum::Ref("b".into())), None);
        assert_eq!(col.read(2), Some(Datum::Ref("b".into())));
        assert!(col.matches(2, &Datum::Ref("b".into())));
        assert!(!col.matches(2, &Datum::Long(1)));
        assert_eq!(
            col.store(2, Datum::Ref("c".into())),
            Some(Datum::Ref("b".into()))
        );
        assert_eq!(col.take(2), Some(Datum::Ref("c".into())));
        assert_eq!(col.read(2), None);
    }

    #[test]
    fn test_column_accepts() {
        let col: SlotColumn<String> = SlotColumn::new(Representation::Int64, 4);
        assert!(col.accepts(&Datum::Long(1), "key").is_ok());
        let err = col.accepts(&Datum::Int(1), "key").unwrap_err();
        assert_eq!(
            err,
            Error::representation_mismatch("key", Representation::Int64, Representation::Int32)
        );
    }

    #[test]
    fn test_column_grow_zero_fills() {
        let mut col: SlotColumn<()> = SlotColumn::new(Representation::Int32, 2);
        col.store(1, Datum::Int(11));
        col.grow(8).unwrap();
        assert_eq!(col.capacity(), 8);
        assert_eq!(col.read(1), Some(Datum::Int(11)));
        assert_eq!(col.read(7), Some(Datum::Int(0)));
        col.grow(4).unwrap();
        assert_eq!(col.capacity(), 8);
    }

    #[test]
    fn test_store_without_value_column() {
        let store: KeyValueStore<String, String> =
            KeyValueStore::new(Representation::Reference, None, 4);
        assert!(store.is_set());
        assert_eq!(
            store.check_value(&Datum::Long(1)).unwrap_err(),
            Error::MissingValueColumn
        );
        assert_eq!(store.read_value(0), None);
    }

    #[test]
    fn test_store_clear_slot() {
        let mut store: KeyValueStore<String, String> =
            KeyValueStore::new(Representation::Int64, Some(Representation::Reference), 4);
        store.store_key(3, Datum::Long(30));
        store.store_value(3, Datum::Ref("thirty".into()));
        assert!(store.key_matches(3, &Datum::Long(30)));

        let (key, value) = store.clear_slot(3);
        assert_eq!(key, Some(Datum::Long(30)));
        assert_eq!(value, Some(Datum::Ref("thirty".into())));
        assert_eq!(store.read_value(3), None);
    }
}
