// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child sources: the seams to external node storage.
//!
//! Hosts bring their own storage by implementing [`NodeSource`] (draft
//! stage) and, when a published/live overlay exists, [`LiveSource`].
//! [`MemorySource`] is a ready-made in-memory implementation for tests,
//! demos, and small static trees.

use alloc::vec::Vec;
use core::error::Error;
use core::fmt;

use hashbrown::HashMap;

use crate::types::{NodeData, NodeKey, NodeKind, StageDiff};

/// Error from a child source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// The source has no child-fetch capability for this node kind.
    ///
    /// This is a wiring mistake, not a data condition: every kind reachable
    /// from a marking, render, or traversal root must be served by the
    /// configured source. The engine propagates it immediately instead of
    /// quietly under-rendering.
    UnsupportedKind(NodeKind),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind(kind) => {
                write!(f, "no child-fetch capability for node kind {}", kind.0)
            }
        }
    }
}

impl Error for SourceError {}

/// Draft-stage node storage.
///
/// Methods take `&mut self` so implementations are free to maintain
/// connections or internal caches. The engine layers its own per-request
/// memoization on top, so a source is consulted at most once per node and
/// child scope until flushed.
pub trait NodeSource {
    /// Resolve a node by key. `Ok(None)` means the node does not exist;
    /// that is a data condition, never an error.
    fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError>;

    /// Children of `parent` on the draft stage, ascending by sort key.
    ///
    /// With `include_all` unset the provider applies its menu-visibility
    /// filter; set, every child is returned. An unknown `parent` yields an
    /// empty list.
    fn children(
        &mut self,
        parent: NodeKey,
        include_all: bool,
    ) -> Result<Vec<NodeData>, SourceError>;

    /// Whether the current viewer may see `key` at all.
    ///
    /// The engine applies this to the menu child set only; editing surfaces
    /// (`All`, `AllWithDeleted`) show everything. The default accepts
    /// everything.
    fn can_view(&mut self, _key: NodeKey) -> bool {
        true
    }
}

/// Live-stage (published) overlay for versioned hierarchies.
///
/// Consulted only for [`ChildScope::AllWithDeleted`] fetches. [`NoLive`] is
/// the null implementation for unversioned hosts.
///
/// [`ChildScope::AllWithDeleted`]: crate::ChildScope::AllWithDeleted
pub trait LiveSource {
    /// Whether versioning applies to `key` at all.
    fn has_versioning(&self, key: NodeKey) -> bool;

    /// Children of `parent` on the live stage, ascending by sort key.
    ///
    /// With `only_missing_from_draft` set, only live children whose draft
    /// counterpart has been deleted are returned.
    fn live_children(
        &mut self,
        parent: NodeKey,
        include_all: bool,
        only_missing_from_draft: bool,
    ) -> Result<Vec<NodeData>, SourceError>;

    /// Draft/live provenance of one node. The default reports
    /// [`StageDiff::Unchanged`].
    fn stage_state(&mut self, _key: NodeKey) -> StageDiff {
        StageDiff::Unchanged
    }
}

/// Null [`LiveSource`]: no versioning anywhere.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLive;

impl LiveSource for NoLive {
    fn has_versioning(&self, _key: NodeKey) -> bool {
        false
    }

    fn live_children(
        &mut self,
        _parent: NodeKey,
        _include_all: bool,
        _only_missing_from_draft: bool,
    ) -> Result<Vec<NodeData>, SourceError> {
        Ok(Vec::new())
    }
}

/// In-memory [`NodeSource`] for tests, demos, and small static trees.
///
/// Nodes are registered with [`insert`](Self::insert); parent/child links
/// are derived from each node's `parent` field within its kind. Children
/// are served in ascending `(sort, id)` order, and each served payload's
/// `child_count` is recomputed from the registered children, so callers
/// never maintain it by hand. Queries are linear scans; this is meant for
/// small trees, not as a production store.
///
/// There is no versioning here; pair it with [`NoLive`].
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    nodes: HashMap<NodeKey, NodeData>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a node.
    pub fn insert(&mut self, data: NodeData) {
        self.nodes.insert(data.key, data);
    }

    /// Remove a node. Children of a removed node keep their parent link and
    /// become unreachable through it.
    pub fn remove(&mut self, key: NodeKey) -> Option<NodeData> {
        self.nodes.remove(&key)
    }

    /// Mutable access to a registered node's payload.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut NodeData> {
        self.nodes.get_mut(&key)
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Child counts are intentionally 32-bit."
    )]
    fn count_children(&self, parent: NodeKey) -> u32 {
        self.nodes
            .values()
            .filter(|n| n.key.kind == parent.kind && n.parent == Some(parent.id))
            .count() as u32
    }

    fn finish(&self, mut data: NodeData) -> NodeData {
        data.child_count = self.count_children(data.key);
        data
    }
}

impl NodeSource for MemorySource {
    fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError> {
        Ok(self.nodes.get(&key).cloned().map(|d| self.finish(d)))
    }

    fn children(
        &mut self,
        parent: NodeKey,
        include_all: bool,
    ) -> Result<Vec<NodeData>, SourceError> {
        let mut out: Vec<NodeData> = self
            .nodes
            .values()
            .filter(|n| n.key.kind == parent.kind && n.parent == Some(parent.id))
            .filter(|n| include_all || n.in_menus)
            .cloned()
            .collect();
        out.sort_unstable_by_key(|n| (n.sort, n.key.id));
        Ok(out.into_iter().map(|d| self.finish(d)).collect())
    }
}
