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

//! Transaction registry for MVCC visibility
//!
//! Tracks which transactions are active and which have committed, hands out
//! transaction ids and begin/commit sequences, and answers "is a version
//! written by transaction A visible to transaction B". The registry is an
//! ordinary value passed to whoever needs it; there is no global instance.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

use crate::core::{Error, IsolationLevel, Result};

use super::visibility::VisibilityContext;

/// Transaction id used for rows loaded outside any transaction
///
/// Versions written by it are visible to everyone.
pub const BOOTSTRAP_TRANSACTION_ID: i64 = -1;

type SequenceTable = DashMap<i64, i64, FxBuildHasher>;

/// Transaction states and visibility rules
///
/// Supports READ COMMITTED and SNAPSHOT isolation.
///
/// # Transaction States
///
/// 1. **Active**: in progress, changes visible only to itself
/// 2. **Committed**: changes visible per isolation rules
/// 3. **Aborted**: forgotten; its versions are never visible to others
///
/// The state tables are `DashMap`s and id/sequence generation is atomic, so
/// begin, commit and visibility checks never block each other.
pub struct TransactionRegistry {
    /// Next transaction ID to assign
    next_txn_id: AtomicI64,

    /// Active transactions: txn_id -> begin_sequence
    active_transactions: SequenceTable,

    /// Committed transactions: txn_id -> commit_sequence
    committed_transactions: SequenceTable,

    /// Isolation level for transactions without an override
    global_isolation_level: RwLock<IsolationLevel>,

    /// Per-transaction isolation level overrides
    transaction_isolation_levels: RwLock<FxHashMap<i64, IsolationLevel>>,

    /// Whether new transactions are being accepted
    accepting: AtomicBool,

    /// Monotonic sequence for both begin and commit ordering
    next_sequence: AtomicI64,
}

impl TransactionRegistry {
    /// Creates a new transaction registry
    pub fn new() -> Self {
        Self {
            next_txn_id: AtomicI64::new(0),
            active_transactions: DashMap::with_hasher(FxBuildHasher),
            committed_transactions: DashMap::with_hasher(FxBuildHasher),
            global_isolation_level: RwLock::new(IsolationLevel::ReadCommitted),
            transaction_isolation_levels: RwLock::new(FxHashMap::default()),
            accepting: AtomicBool::new(true),
            next_sequence: AtomicI64::new(0),
        }
    }

    /// Sets the isolation level for new transactions without an override
    pub fn set_global_isolation_level(&self, level: IsolationLevel) {
        *self.global_isolation_level.write() = level;
    }

    pub fn global_isolation_level(&self) -> IsolationLevel {
        *self.global_isolation_level.read()
    }

    /// Sets the isolation level for a specific transaction
    pub fn set_transaction_isolation_level(&self, txn_id: i64, level: IsolationLevel) {
        self.transaction_isolation_levels.write().insert(txn_id, level);
    }

    /// Isolation level for `txn_id`: its override, or the global level
    pub fn isolation_level(&self, txn_id: i64) -> IsolationLevel {
        if let Some(&level) = self.transaction_isolation_levels.read().get(&txn_id) {
            return level;
        }
        self.global_isolation_level()
    }

    /// Begins a new transaction at the global isolation level
    ///
    /// Returns `(txn_id, begin_sequence)`.
    pub fn begin(&self) -> Result<(i64, i64)> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(Error::NotAccepting);
        }

        let txn_id = self.next_txn_id.fetch_add(1, Ordering::AcqRel) + 1;
        let begin_seq = self.next_sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.active_transactions.insert(txn_id, begin_seq);

        trace!(txn_id, begin_seq, "transaction begin");
        Ok((txn_id, begin_seq))
    }

    /// Begins a new transaction with an isolation override
    pub fn begin_with_isolation(&self, level: IsolationLevel) -> Result<(i64, i64)> {
        let (txn_id, begin_seq) = self.begin()?;
        self.set_transaction_isolation_level(txn_id, level);
        Ok((txn_id, begin_seq))
    }

    /// Commits an active transaction, returning its commit sequence
    pub fn commit(&self, txn_id: i64) -> Result<i64> {
        if self.active_transactions.remove(&txn_id).is_none() {
            return Err(Error::TransactionNotActive(txn_id));
        }
        let commit_seq = self.next_sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.committed_transactions.insert(txn_id, commit_seq);
        self.transaction_isolation_levels.write().remove(&txn_id);

        trace!(txn_id, commit_seq, "transaction commit");
        Ok(commit_seq)
    }

    /// Aborts an active transaction
    pub fn abort(&self, txn_id: i64) -> Result<()> {
        if self.active_transactions.remove(&txn_id).is_none() {
            return Err(Error::TransactionNotActive(txn_id));
        }
        self.transaction_isolation_levels.write().remove(&txn_id);

        trace!(txn_id, "transaction abort");
        Ok(())
    }

    /// Commit sequence of a committed transaction
    pub fn commit_sequence(&self, txn_id: i64) -> Option<i64> {
        self.committed_transactions.get(&txn_id).map(|r| *r)
    }

    /// Begin sequence of an active transaction
    pub fn begin_sequence(&self, txn_id: i64) -> Option<i64> {
        self.active_transactions.get(&txn_id).map(|r| *r)
    }

    /// Visibility context for an active transaction
    pub fn context(&self, txn_id: i64, session_id: i64) -> Result<VisibilityContext> {
        let snapshot_seq = self
            .begin_sequence(txn_id)
            .ok_or(Error::TransactionNotActive(txn_id))?;
        Ok(VisibilityContext::new(
            session_id,
            txn_id,
            self.isolation_level(txn_id),
            snapshot_seq,
        ))
    }

    /// Checks if a version is visible to READ COMMITTED readers
    #[inline(always)]
    pub fn is_directly_visible(&self, version_txn_id: i64) -> bool {
        version_txn_id == BOOTSTRAP_TRANSACTION_ID
            || self.committed_transactions.contains_key(&version_txn_id)
    }

    /// Determines if a version written by `version_txn_id` is visible to the
    /// active transaction `viewer_txn_id`
    #[inline]
    pub fn is_visible(&self, version_txn_id: i64, viewer_txn_id: i64) -> bool {
        if version_txn_id == viewer_txn_id {
            return true;
        }
        match self.isolation_level(viewer_txn_id) {
            IsolationLevel::ReadCommitted => self.is_directly_visible(version_txn_id),
            IsolationLevel::SnapshotIsolation => match self.begin_sequence(viewer_txn_id) {
                Some(snapshot_seq) => self.committed_at_or_before(version_txn_id, snapshot_seq),
                None => false,
            },
        }
    }

    /// Determines if a version written by `version_txn_id` is visible under
    /// `ctx`, using the context's own isolation level and snapshot
    #[inline]
    pub fn is_visible_in(&self, version_txn_id: i64, ctx: &VisibilityContext) -> bool {
        if version_txn_id == ctx.txn_id {
            return true;
        }
        match ctx.isolation {
            IsolationLevel::ReadCommitted => self.is_directly_visible(version_txn_id),
            IsolationLevel::SnapshotIsolation => {
                self.committed_at_or_before(version_txn_id, ctx.snapshot_seq)
            }
        }
    }

    #[inline]
    fn committed_at_or_before(&self, version_txn_id: i64, snapshot_seq: i64) -> bool {
        if version_txn_id == BOOTSTRAP_TRANSACTION_ID {
            return true;
        }
        match self.commit_sequence(version_txn_id) {
            Some(commit_seq) => commit_seq <= snapshot_seq,
            None => false,
        }
    }

    /// Stops accepting new transactions
    pub fn stop_accepting_transactions(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    /// Starts accepting new transactions
    pub fn start_accepting_transactions(&self) {
        self.accepting.store(true, Ordering::Release);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    pub fn active_count(&self) -> usize {
        self.active_transactions.len()
    }

    pub fn is_active(&self, txn_id: i64) -> bool {
        self.active_transactions.contains_key(&txn_id)
    }

    pub fn is_committed(&self, txn_id: i64) -> bool {
        txn_id == BOOTSTRAP_TRANSACTION_ID || self.committed_transactions.contains_key(&txn_id)
    }

    /// Returns true if `txn_id` was issued and ended without committing
    pub fn is_aborted(&self, txn_id: i64) -> bool {
        txn_id > 0
            && txn_id <= self.next_txn_id.load(Ordering::Acquire)
            && !self.is_active(txn_id)
            && !self.is_committed(txn_id)
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
