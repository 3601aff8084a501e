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

//! Hash functions for slot-indexed tables
//!
//! - Integer keys use an identity-derived hash: FxHash with pre-mixing (XOR>>16
//!   before multiply), bijective over the key space
//! - Reference keys hash through the caller's `BuildHasher`, defaulting to
//!   rustc-hash's `FxBuildHasher`

use std::hash::{BuildHasher, Hash};

pub use rustc_hash::FxBuildHasher;

const FX_SEED: u64 = 0x517cc1b727220a95;

/// Scrambled identity hash for a 64-bit key
///
/// The pre-mix breaks stride patterns (keys that are multiples of a power of
/// two) that would otherwise land in the same low bits.
#[inline(always)]
pub fn hash_i64(key: i64) -> u64 {
    let k = key as u64;
    let k = k ^ (k >> 16);
    k.wrapping_mul(FX_SEED)
}

/// Scrambled identity hash for a 32-bit key
#[inline(always)]
pub fn hash_i32(key: i32) -> u64 {
    hash_i64(key as i64)
}

/// Hash a reference key through the caller-supplied hasher
#[inline]
pub fn hash_reference<T: Hash + ?Sized, S: BuildHasher>(build: &S, key: &T) -> u64 {
    build.hash_one(key)
}

/// Map a full hash to a bucket of a power-of-two table
///
/// Folds the high half into the low half first: multiplicative hashes keep
/// most of their entropy in the high bits.
#[inline(always)]
pub fn bucket_of(hash: u64, mask: usize) -> usize {
    ((hash ^ (hash >> 32)) as usize) & mask
}
