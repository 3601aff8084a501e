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

//! Visibility context and the visibility filter
//!
//! Every traversal that hands rows to a caller runs through
//! [`VisibilityFilter`]. Rejected rows are skipped and the walk continues
//! with the next structural neighbor.

use std::fmt;

use crate::core::IsolationLevel;
use crate::storage::traits::RowProvider;

/// Per-call description of who is looking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityContext {
    /// Session issuing the call
    pub session_id: i64,
    /// Viewing transaction; its own writes are always visible
    pub txn_id: i64,
    /// Isolation level of the viewing transaction
    pub isolation: IsolationLevel,
    /// Begin sequence of the viewing transaction; snapshot isolation sees
    /// only commits at or before it
    pub snapshot_seq: i64,
}

impl VisibilityContext {
    pub fn new(
        session_id: i64,
        txn_id: i64,
        isolation: IsolationLevel,
        snapshot_seq: i64,
    ) -> Self {
        Self {
            session_id,
            txn_id,
            isolation,
            snapshot_seq,
        }
    }

    /// Returns true if the viewer reads from a fixed snapshot
    #[inline]
    pub fn is_snapshot(&self) -> bool {
        self.isolation == IsolationLevel::SnapshotIsolation
    }
}

impl fmt::Display for VisibilityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {} txn {} ({}, snapshot {})",
            self.session_id, self.txn_id, self.isolation, self.snapshot_seq
        )
    }
}

/// Iterator adapter yielding only rows visible under a context
pub struct VisibilityFilter<'a, P: RowProvider, I> {
    provider: &'a P,
    ctx: VisibilityContext,
    inner: I,
    skipped: usize,
}

impl<'a, P, I> VisibilityFilter<'a, P, I>
where
    P: RowProvider,
    I: Iterator<Item = P::Row>,
{
    pub fn new(provider: &'a P, ctx: VisibilityContext, inner: I) -> Self {
        Self {
            provider,
            ctx,
            inner,
            skipped: 0,
        }
    }

    pub fn context(&self) -> &VisibilityContext {
        &self.ctx
    }

    /// Rows rejected so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The unfiltered iterator
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<P, I> Iterator for VisibilityFilter<'_, P, I>
where
    P: RowProvider,
    I: Iterator<Item = P::Row>,
{
    type Item = P::Row;

    fn next(&mut self) -> Option<P::Row> {
        for row in self.inner.by_ref() {
            if self.provider.is_visible(&row, &self.ctx) {
                return Some(row);
            }
            self.skipped += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
