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

//! AVL tree over an index-linked node arena
//!
//! Nodes live in a [`SlotArena`] and refer to each other by slot, with
//! `NIL` for a missing link. The tree knows nothing about keys: every
//! ordering decision is a closure supplied by the caller, so the same
//! structure serves any comparator and any row handle type.
//!
//! Balance factor is `height(left) - height(right)` and always lies in
//! `-1..=1` between operations.

use std::cmp::Ordering;

use crate::core::{Error, Result};
use crate::storage::arena::{Slot, SlotArena, NIL};
use crate::storage::config::MAX_SLOTS;

/// Node count of a fresh tree's arena
const MIN_NODES: usize = 16;

/// One tree node
#[derive(Debug, Clone)]
pub struct AvlNode<R> {
    pub row: R,
    pub left: Slot,
    pub right: Slot,
    pub parent: Slot,
    pub balance: i8,
}

impl<R: Default> Default for AvlNode<R> {
    fn default() -> Self {
        Self {
            row: R::default(),
            left: NIL,
            right: NIL,
            parent: NIL,
            balance: 0,
        }
    }
}

/// Which child link of `parent` a new node attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Where a new row goes, plus its in-order neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    pub parent: Slot,
    pub side: Side,
    /// Node that will precede the new one, or `NIL`
    pub predecessor: Slot,
    /// Node that will follow the new one, or `NIL`
    pub successor: Slot,
}

/// Shape statistics returned by [`AvlTree::verify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub len: usize,
    pub height: usize,
}

/// Balanced binary search tree of row handles
#[derive(Debug, Clone)]
pub struct AvlTree<R> {
    nodes: SlotArena<AvlNode<R>>,
    root: Slot,
}

impl<R: Clone + Default> Default for AvlTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone + Default> AvlTree<R> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_NODES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotArena::with_capacity(capacity.clamp(1, MAX_SLOTS)),
            root: NIL,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    #[inline]
    pub fn root(&self) -> Slot {
        self.root
    }

    /// Row held by a live node
    #[inline]
    pub fn row(&self, slot: Slot) -> &R {
        &self.nodes[slot].row
    }

    #[inline]
    pub fn node(&self, slot: Slot) -> &AvlNode<R> {
        &self.nodes[slot]
    }

    /// Height of the tree, following the taller side from the root
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while current != NIL {
            height += 1;
            let node = &self.nodes[current];
            current = if node.balance < 0 { node.right } else { node.left };
        }
        height
    }

    /// Leftmost node, or `NIL`
    pub fn first(&self) -> Slot {
        if self.root == NIL {
            NIL
        } else {
            self.leftmost(self.root)
        }
    }

    /// Rightmost node, or `NIL`
    pub fn last(&self) -> Slot {
        if self.root == NIL {
            NIL
        } else {
            self.rightmost(self.root)
        }
    }

    fn leftmost(&self, mut slot: Slot) -> Slot {
        while self.nodes[slot].left != NIL {
            slot = self.nodes[slot].left;
        }
        slot
    }

    fn rightmost(&self, mut slot: Slot) -> Slot {
        while self.nodes[slot].right != NIL {
            slot = self.nodes[slot].right;
        }
        slot
    }

    /// In-order successor, or `NIL`
    pub fn next(&self, slot: Slot) -> Slot {
        let right = self.nodes[slot].right;
        if right != NIL {
            return self.leftmost(right);
        }
        let mut child = slot;
        let mut parent = self.nodes[slot].parent;
        while parent != NIL && self.nodes[parent].right == child {
            child = parent;
            parent = self.nodes[parent].parent;
        }
        parent
    }

    /// In-order predecessor, or `NIL`
    pub fn prev(&self, slot: Slot) -> Slot {
        let left = self.nodes[slot].left;
        if left != NIL {
            return self.rightmost(left);
        }
        let mut child = slot;
        let mut parent = self.nodes[slot].parent;
        while parent != NIL && self.nodes[parent].left == child {
            child = parent;
            parent = self.nodes[parent].parent;
        }
        parent
    }

    /// First node (in order) for which `pred` holds
    ///
    /// `pred` must be false for a prefix of the in-order sequence and true
    /// for the rest.
    pub fn first_where(&self, mut pred: impl FnMut(&R) -> bool) -> Slot {
        let mut found = NIL;
        let mut current = self.root;
        while current != NIL {
            let node = &self.nodes[current];
            if pred(&node.row) {
                found = current;
                current = node.left;
            } else {
                current = node.right;
            }
        }
        found
    }

    /// Last node (in order) for which `pred` holds
    ///
    /// `pred` must be true for a prefix of the in-order sequence and false
    /// for the rest.
    pub fn last_where(&self, mut pred: impl FnMut(&R) -> bool) -> Slot {
        let mut found = NIL;
        let mut current = self.root;
        while current != NIL {
            let node = &self.nodes[current];
            if pred(&node.row) {
                found = current;
                current = node.right;
            } else {
                current = node.left;
            }
        }
        found
    }

    /// Find where a new row belongs
    ///
    /// `order(existing)` is the order of the new row relative to `existing`.
    /// Rows ordering `Equal` go to the right of the existing node, so an
    /// equal node ends up as the new row's predecessor.
    pub fn insert_point(&self, mut order: impl FnMut(&R) -> Ordering) -> InsertPoint {
        let mut point = InsertPoint {
            parent: NIL,
            side: Side::Left,
            predecessor: NIL,
            successor: NIL,
        };
        let mut current = self.root;
        while current != NIL {
            let node = &self.nodes[current];
            point.parent = current;
            if order(&node.row) == Ordering::Less {
                point.side = Side::Left;
                point.successor = current;
                current = node.left;
            } else {
                point.side = Side::Right;
                point.predecessor = current;
                current = node.right;
            }
        }
        point
    }

    /// Insert `row` using `order` as in [`insert_point`](Self::insert_point)
    pub fn insert(&mut self, row: R, order: impl FnMut(&R) -> Ordering) -> Result<Slot> {
        let point = self.insert_point(order);
        self.attach(point, row)
    }

    /// Link a new node holding `row` at `point` and rebalance
    ///
    /// `point` must come from `insert_point` with no mutation in between.
    pub fn attach(&mut self, point: InsertPoint, row: R) -> Result<Slot> {
        self.ensure_room()?;
        let slot = self
            .nodes
            .allocate(AvlNode {
                row,
                left: NIL,
                right: NIL,
                parent: point.parent,
                balance: 0,
            })
            .ok_or_else(|| Error::internal("node arena full after growth"))?;

        if point.parent == NIL {
            self.root = slot;
        } else {
            match point.side {
                Side::Left => self.nodes[point.parent].left = slot,
                Side::Right => self.nodes[point.parent].right = slot,
            }
        }
        self.retrace_insert(slot);
        Ok(slot)
    }

    fn ensure_room(&mut self) -> Result<()> {
        if self.nodes.has_room() {
            return Ok(());
        }
        let current = self.nodes.capacity();
        if current >= MAX_SLOTS {
            tracing::warn!(limit = MAX_SLOTS, "ordered index node arena exhausted");
            return Err(Error::capacity_exhausted(current + 1, MAX_SLOTS));
        }
        let next = current.saturating_mul(2).clamp(MIN_NODES, MAX_SLOTS);
        self.nodes.grow(next)
    }

    /// Walk up from a new leaf adjusting balance factors
    fn retrace_insert(&mut self, mut child: Slot) {
        let mut parent = self.nodes[child].parent;
        while parent != NIL {
            let delta = if self.nodes[parent].left == child { 1 } else { -1 };
            let balance = self.nodes[parent].balance + delta;
            self.nodes[parent].balance = balance;
            match balance {
                0 => return,
                1 | -1 => {
                    child = parent;
                    parent = self.nodes[parent].parent;
                }
                _ => {
                    // One rotation restores the height the subtree had
                    // before the insert
                    self.rebalance(parent);
                    return;
                }
            }
        }
    }

    /// Unlink node `slot` and return its row
    ///
    /// A node with two children takes its successor's row and the
    /// successor's node is unlinked instead.
    pub fn remove(&mut self, slot: Slot) -> Option<R> {
        if !self.nodes.is_live(slot) {
            return None;
        }

        let mut target = slot;
        if self.nodes[slot].left != NIL && self.nodes[slot].right != NIL {
            let successor = self.leftmost(self.nodes[slot].right);
            let moved = std::mem::take(&mut self.nodes[successor].row);
            let removed = std::mem::replace(&mut self.nodes[slot].row, moved);
            self.nodes[successor].row = removed;
            target = successor;
        }

        let node = &self.nodes[target];
        let child = if node.left != NIL { node.left } else { node.right };
        let parent = node.parent;
        let from_left = parent != NIL && self.nodes[parent].left == target;

        if child != NIL {
            self.nodes[child].parent = parent;
        }
        self.replace_child(parent, target, child);
        let removed = self.nodes.release(target).map(|n| n.row);
        self.retrace_delete(parent, from_left);
        removed
    }

    /// Walk up from the parent of a removed node adjusting balance factors
    ///
    /// Unlike insert, several ancestors may need rotations.
    fn retrace_delete(&mut self, mut node: Slot, mut from_left: bool) {
        while node != NIL {
            let balance = self.nodes[node].balance + if from_left { -1 } else { 1 };
            self.nodes[node].balance = balance;

            let subtree = match balance {
                // Height unchanged
                1 | -1 => return,
                0 => node,
                _ => {
                    let root = self.rebalance(node);
                    if self.nodes[root].balance != 0 {
                        return;
                    }
                    root
                }
            };

            let up = self.nodes[subtree].parent;
            if up == NIL {
                return;
            }
            from_left = self.nodes[up].left == subtree;
            node = up;
        }
    }

    /// Rotate an unbalanced node, returning the new subtree root
    fn rebalance(&mut self, node: Slot) -> Slot {
        let balance = self.nodes[node].balance;
        if balance > 1 {
            let left = self.nodes[node].left;
            if self.nodes[left].balance < 0 {
                self.rotate_left(left);
            }
            self.rotate_right(node)
        } else if balance < -1 {
            let right = self.nodes[node].right;
            if self.nodes[right].balance > 0 {
                self.rotate_right(right);
            }
            self.rotate_left(node)
        } else {
            node
        }
    }

    /// Rotate `x` down to the left; its right child takes its place
    fn rotate_left(&mut self, x: Slot) -> Slot {
        let z = self.nodes[x].right;
        let inner = self.nodes[z].left;
        let parent = self.nodes[x].parent;

        self.nodes[x].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        self.nodes[z].left = x;
        self.nodes[x].parent = z;
        self.nodes[z].parent = parent;
        self.replace_child(parent, x, z);

        let xb = self.nodes[x].balance;
        let zb = self.nodes[z].balance;
        let new_x = xb + 1 - zb.min(0);
        let new_z = zb + 1 + new_x.max(0);
        self.nodes[x].balance = new_x;
        self.nodes[z].balance = new_z;
        z
    }

    /// Rotate `x` down to the right; its left child takes its place
    fn rotate_right(&mut self, x: Slot) -> Slot {
        let y = self.nodes[x].left;
        let inner = self.nodes[y].right;
        let parent = self.nodes[x].parent;

        self.nodes[x].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, y);

        let xb = self.nodes[x].balance;
        let yb = self.nodes[y].balance;
        let new_x = xb - 1 - yb.max(0);
        let new_y = yb - 1 + new_x.min(0);
        self.nodes[x].balance = new_x;
        self.nodes[y].balance = new_y;
        y
    }

    /// Point `parent`'s link at `old` (or the root) to `new`
    fn replace_child(&mut self, parent: Slot, old: Slot, new: Slot) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    /// Drop every node; arena capacity is kept
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
    }

    /// Rows in order
    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        let mut current = self.first();
        std::iter::from_fn(move || {
            if current == NIL {
                return None;
            }
            let slot = current;
            current = self.next(slot);
            Some(&self.nodes[slot].row)
        })
    }

    /// Check links, heights, stored balance factors and ordering
    ///
    /// Heights are recomputed from the structure; stored balance factors
    /// are compared against them, never trusted. `order(a, b)` must not be
    /// `Greater` for consecutive rows.
    pub fn verify(&self, mut order: impl FnMut(&R, &R) -> Ordering) -> Result<TreeStats> {
        if self.root != NIL && self.nodes[self.root].parent != NIL {
            return Err(Error::internal("root has a parent link"));
        }
        let height = self.check_subtree(self.root, NIL, 0)?;

        let mut len = 0;
        let mut prev = NIL;
        let mut current = self.first();
        while current != NIL {
            len += 1;
            if len > self.nodes.len() {
                return Err(Error::internal("in-order walk does not terminate"));
            }
            if prev != NIL
                && order(&self.nodes[prev].row, &self.nodes[current].row) == Ordering::Greater
            {
                return Err(Error::internal(format!(
                    "nodes {} and {} out of order",
                    prev, current
                )));
            }
            prev = current;
            current = self.next(current);
        }
        if len != self.nodes.len() {
            return Err(Error::internal(format!(
                "{} live nodes but {} reachable",
                self.nodes.len(),
                len
            )));
        }
        Ok(TreeStats { len, height })
    }

    fn check_subtree(&self, slot: Slot, parent: Slot, depth: usize) -> Result<usize> {
        if slot == NIL {
            return Ok(0);
        }
        if !self.nodes.is_live(slot) {
            return Err(Error::internal(format!("link to free node {}", slot)));
        }
        if depth > self.nodes.len() {
            return Err(Error::internal("cycle in node links"));
        }
        let node = &self.nodes[slot];
        if node.parent != parent {
            return Err(Error::internal(format!(
                "node {} parent link {} should be {}",
                slot, node.parent, parent
            )));
        }
        let left = self.check_subtree(node.left, slot, depth + 1)?;
        let right = self.check_subtree(node.right, slot, depth + 1)?;
        let diff = left as i64 - right as i64;
        if diff.abs() > 1 {
            return Err(Error::internal(format!(
                "node {} unbalanced: left height {}, right height {}",
                slot, left, right
            )));
        }
        if diff != i64::from(node.balance) {
            return Err(Error::internal(format!(
                "node {} stored balance {} but measured {}",
                slot, node.balance, diff
            )));
        }
        Ok(1 + left.max(right))
    }
}
