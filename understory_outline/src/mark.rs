// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Budgeted breadth-first marking.
//!
//! A marking pass walks outward from a root, admitting children level by
//! level until a node budget is met, and records what it saw in a
//! caller-owned [`MarkState`]. The state is deliberately not stored on the
//! [`Outline`]: two concurrent requests sharing one outline-shaped store
//! must never interleave their marks, so each pass receives its own state
//! by reference.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::filter::MarkFilter;
use crate::outline::Outline;
use crate::source::{LiveSource, NodeSource, SourceError};
use crate::types::{ChildScope, NodeId, NodeIdx, NodeKey};

/// Node budget used when a marking pass is given `None` or zero.
pub const DEFAULT_NODE_BUDGET: usize = 30;

bitflags::bitflags! {
    /// Per-node marking flags.
    ///
    /// `MARKED` says the node belongs to the partial tree; `EXPANDED` says
    /// its children have been fetched (childless nodes count as trivially
    /// expanded); `OPENED` says the rendered tree should show it open.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MarkFlags: u8 {
        /// Part of the marked set.
        const MARKED   = 0b0000_0001;
        /// Children have been fetched, or there are none to fetch.
        const EXPANDED = 0b0000_0010;
        /// Forced open in the rendered tree.
        const OPENED   = 0b0000_0100;
    }
}

impl Default for MarkFlags {
    /// No flags set.
    fn default() -> Self {
        Self::empty()
    }
}

/// Marking state for one partial-tree pass, owned by the caller.
///
/// Flags are keyed by [`NodeKey`], so nodes of different kinds sharing an
/// id pool never collide. Absent entries read as all-false. The marked
/// *membership* (discovery order and id lookup) is rebuilt by each
/// [`Outline::mark_partial_tree`] call; the flag table is cleared along
/// with it.
#[derive(Clone, Debug, Default)]
pub struct MarkState {
    flags: HashMap<NodeKey, MarkFlags>,
    order: Vec<NodeIdx>,
    members: HashMap<NodeId, NodeIdx>,
}

impl MarkState {
    /// Fresh, empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every flag and member.
    pub fn clear(&mut self) {
        self.flags.clear();
        self.order.clear();
        self.members.clear();
    }

    /// Flags recorded for `key`; empty if it was never marked.
    #[must_use]
    pub fn flags(&self, key: NodeKey) -> MarkFlags {
        self.flags.get(&key).copied().unwrap_or_default()
    }

    /// Whether `key` is in the marked set.
    #[must_use]
    pub fn is_marked(&self, key: NodeKey) -> bool {
        self.flags(key).contains(MarkFlags::MARKED)
    }

    /// Whether `key`'s children have been fetched (or it has none).
    #[must_use]
    pub fn is_expanded(&self, key: NodeKey) -> bool {
        self.flags(key).contains(MarkFlags::EXPANDED)
    }

    /// Whether `key` is forced open in the rendered tree.
    #[must_use]
    pub fn is_opened(&self, key: NodeKey) -> bool {
        self.flags(key).contains(MarkFlags::OPENED)
    }

    /// Mark `key` with its children fetched.
    pub fn mark_expanded(&mut self, key: NodeKey) {
        self.flags
            .entry(key)
            .or_default()
            .insert(MarkFlags::MARKED | MarkFlags::EXPANDED);
    }

    /// Mark `key` with its children still unfetched.
    pub fn mark_unexpanded(&mut self, key: NodeKey) {
        let flags = self.flags.entry(key).or_default();
        flags.insert(MarkFlags::MARKED);
        flags.remove(MarkFlags::EXPANDED);
    }

    /// Mark `key` and force it open.
    pub fn mark_opened(&mut self, key: NodeKey) {
        self.flags
            .entry(key)
            .or_default()
            .insert(MarkFlags::MARKED | MarkFlags::OPENED);
    }

    /// Mark `key` and force it closed.
    pub fn unmark_opened(&mut self, key: NodeKey) {
        let flags = self.flags.entry(key).or_default();
        flags.insert(MarkFlags::MARKED);
        flags.remove(MarkFlags::OPENED);
    }

    /// Number of nodes admitted by the most recent marking pass.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.order.len()
    }

    /// Marked nodes in breadth-first discovery order.
    #[must_use]
    pub fn marked_order(&self) -> &[NodeIdx] {
        &self.order
    }

    /// The marked node with this id, if the most recent pass admitted one.
    #[must_use]
    pub fn member(&self, id: NodeId) -> Option<NodeIdx> {
        self.members.get(&id).copied()
    }

    /// CSS-style hints for the rendered tree: `"unexpanded"` when children
    /// are unfetched, `"closed"` when not forced open, both or neither.
    #[must_use]
    pub fn marking_classes(&self, key: NodeKey) -> &'static str {
        let flags = self.flags(key);
        match (
            flags.contains(MarkFlags::EXPANDED),
            flags.contains(MarkFlags::OPENED),
        ) {
            (false, false) => "unexpanded closed",
            (false, true) => "unexpanded",
            (true, false) => "closed",
            (true, true) => "",
        }
    }

    /// Record membership; the first admission of an id wins.
    fn admit(&mut self, id: NodeId, idx: NodeIdx) {
        if !self.members.contains_key(&id) {
            self.members.insert(id, idx);
            self.order.push(idx);
        }
    }
}

impl<S: NodeSource, L: LiveSource> Outline<S, L> {
    /// Mark a partial tree of roughly `budget` nodes starting at `root`.
    ///
    /// The frontier expands breadth-first: nodes are processed in discovery
    /// order, each one fetching its children under `scope` and admitting
    /// those that pass the [mark filter](Self::set_mark_filter). The root is
    /// admitted unconditionally. The pass stops once the marked set has
    /// reached `budget` (checked after each node's full child batch, so the
    /// count may overshoot) or the tree is exhausted. `None` or zero means
    /// [`DEFAULT_NODE_BUDGET`].
    ///
    /// `marks` is cleared first; the same state can be reused across passes
    /// on the same outline. Returns the marked count.
    ///
    /// # Example
    ///
    /// ```
    /// use understory_outline::{
    ///     ChildScope, MarkState, MemorySource, NodeData, NodeId, NodeKey, NodeKind, Outline,
    /// };
    ///
    /// let kind = NodeKind(0);
    /// let mut store = MemorySource::new();
    /// for (id, parent) in [(1, None), (2, Some(1)), (3, Some(1))] {
    ///     store.insert(NodeData {
    ///         key: NodeKey::new(kind, NodeId(id)),
    ///         parent: parent.map(NodeId),
    ///         ..NodeData::default()
    ///     });
    /// }
    ///
    /// let mut outline = Outline::new(store);
    /// let root = outline.load(NodeKey::new(kind, NodeId(1)))?.unwrap();
    /// let mut marks = MarkState::new();
    /// let count = outline.mark_partial_tree(root, None, ChildScope::All, &mut marks)?;
    /// assert_eq!(count, 3);
    /// # Ok::<_, understory_outline::SourceError>(())
    /// ```
    pub fn mark_partial_tree(
        &mut self,
        root: NodeIdx,
        budget: Option<usize>,
        scope: ChildScope,
        marks: &mut MarkState,
    ) -> Result<usize, SourceError> {
        let budget = match budget {
            Some(n) if n > 0 => n,
            _ => DEFAULT_NODE_BUDGET,
        };
        let filter = self.mark_filter().clone();

        marks.clear();
        let root_key = self.data(root).key;
        marks.mark_unexpanded(root_key);
        marks.admit(root_key.id, root);

        // The marked set grows while we iterate it, so walk by index.
        let mut cursor = 0;
        while cursor < marks.order.len() {
            let node = marks.order[cursor];
            cursor += 1;
            self.admit_children(node, scope, &filter, marks)?;
            if marks.marked_count() >= budget {
                break;
            }
        }
        Ok(marks.marked_count())
    }

    /// Force expanded onto marked childless nodes still flagged unexpanded.
    ///
    /// Covers nodes whose child count was stale or unknown when they were
    /// admitted. Renderers that trust the expanded flag should run this
    /// once after marking.
    pub fn finish_marking(&self, marks: &mut MarkState) {
        let mut fixups: SmallVec<[NodeKey; 8]> = SmallVec::new();
        for &idx in &marks.order {
            let data = self.data(idx);
            if data.child_count == 0 && !marks.is_expanded(data.key) {
                fixups.push(data.key);
            }
        }
        for key in fixups {
            marks.mark_expanded(key);
        }
    }

    /// Re-expand the marked node with this id, admitting its children
    /// (again) under `scope`, and optionally force it open.
    ///
    /// Returns `Ok(false)` without side effects if no node with that id is
    /// in the marked set.
    pub fn mark_by_id(
        &mut self,
        id: NodeId,
        scope: ChildScope,
        open: bool,
        marks: &mut MarkState,
    ) -> Result<bool, SourceError> {
        let Some(idx) = marks.member(id) else {
            return Ok(false);
        };
        let filter = self.mark_filter().clone();
        self.admit_children(idx, scope, &filter, marks)?;
        if open {
            marks.mark_opened(self.data(idx).key);
        }
        Ok(true)
    }

    /// Mark and open the whole ancestor chain of `target`, root first, so a
    /// deeply nested node renders along an unbroken open path.
    ///
    /// Each step re-expands an ancestor via [`mark_by_id`], which admits the
    /// next node in the chain; the chain therefore opens only below a root
    /// that an earlier marking pass already admitted. Returns whether the
    /// target itself ended up in the marked set (`Ok(false)` on a fresh
    /// `marks`, or when the mark filter excludes part of the chain).
    ///
    /// [`mark_by_id`]: Self::mark_by_id
    pub fn expose_path(
        &mut self,
        target: NodeIdx,
        scope: ChildScope,
        marks: &mut MarkState,
    ) -> Result<bool, SourceError> {
        let chain = self.parent_stack(target)?;
        let mut exposed = false;
        for &idx in chain.iter().rev() {
            let id = self.data(idx).key.id;
            exposed = self.mark_by_id(id, scope, true, marks)?;
        }
        Ok(exposed)
    }

    /// The chain from `from` up to its root: `from` first, root last.
    ///
    /// Ancestors are resolved through the draft source and interned. A
    /// parent id that the source cannot resolve ends the chain there. A
    /// parent cycle is a caller error and will not terminate.
    pub fn parent_stack(&mut self, from: NodeIdx) -> Result<Vec<NodeIdx>, SourceError> {
        let mut chain = vec![from];
        let mut cur = from;
        while let Some(parent_id) = self.data(cur).parent {
            let parent_key = NodeKey::new(self.data(cur).key.kind, parent_id);
            match self.load(parent_key)? {
                Some(parent) => {
                    chain.push(parent);
                    cur = parent;
                }
                None => break,
            }
        }
        Ok(chain)
    }

    /// Fetch `idx`'s children under `scope`, mark `idx` expanded, and admit
    /// every child that passes `filter`.
    fn admit_children(
        &mut self,
        idx: NodeIdx,
        scope: ChildScope,
        filter: &MarkFilter,
        marks: &mut MarkState,
    ) -> Result<(), SourceError> {
        let children = self.children_of(idx, scope)?;
        marks.mark_expanded(self.data(idx).key);
        for child in children {
            let data = self.data(child);
            if !filter.matches(data) {
                continue;
            }
            let key = data.key;
            if data.child_count > 0 {
                marks.mark_unexpanded(key);
            } else {
                marks.mark_expanded(key);
            }
            marks.admit(key.id, child);
        }
        Ok(())
    }
}
