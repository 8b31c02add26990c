// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity and payload types shared across the crate.

use alloc::string::String;

/// Discriminates pools of node identifiers.
///
/// Hierarchies frequently host several node families whose storage assigns
/// ids independently. Tagging every identity with its kind keeps those pools
/// from colliding in mark tables and caches. Parent links stay within one
/// kind; a tree never spans kinds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKind(pub u16);

/// Sub-classification of nodes within one kind (a page type, say).
///
/// Ids are allocated per [`NodeKind`]; variants discriminate flavors of node
/// inside one pool. Marking filters and the traversal type filter select on
/// the variant, not the kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeVariant(pub u16);

/// Integer id assigned to a node by the external store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Full identity of a node: kind tag plus store id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    /// Which identifier pool `id` belongs to.
    pub kind: NodeKind,
    /// Store-assigned id within that pool.
    pub id: NodeId,
}

impl NodeKey {
    /// Create a key from a kind and an id.
    #[inline]
    pub const fn new(kind: NodeKind, id: NodeId) -> Self {
        Self { kind, id }
    }
}

/// Handle for a node interned into an [`Outline`] arena.
///
/// Indices are stable for the lifetime of their arena: interning the same
/// [`NodeKey`] again returns the same index, and nothing is ever removed.
/// Indices from one outline are meaningless in another.
///
/// [`Outline`]: crate::Outline
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdx(u32);

impl NodeIdx {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Arena indices are intentionally 32-bit; an outline never holds 2^32 nodes."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Node payload as provided by a [`NodeSource`].
///
/// [`NodeSource`]: crate::NodeSource
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    /// Identity of the node.
    pub key: NodeKey,
    /// Flavor of node within its kind.
    pub variant: NodeVariant,
    /// Parent id within the same kind; `None` for a tree root.
    pub parent: Option<NodeId>,
    /// Sibling order; lower sorts first.
    pub sort: i64,
    /// Whether navigation menus should show this node.
    pub in_menus: bool,
    /// The provider's count of draft children. Zero means known childless;
    /// a conservative overcount only costs a useless expander affordance.
    pub child_count: u32,
    /// Display string used by markup templates.
    pub title: String,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            key: NodeKey::new(NodeKind(0), NodeId(0)),
            variant: NodeVariant(0),
            parent: None,
            sort: 0,
            in_menus: true,
            child_count: 0,
            title: String::new(),
        }
    }
}

/// Which child set an operation works with.
///
/// The set of strategies is closed; marking and rendering calls take the
/// scope explicitly rather than resolving a strategy by name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChildScope {
    /// Draft children shown in navigation menus, filtered through the
    /// source's view-permission hook.
    Menu,
    /// All draft children, including those hidden from menus.
    All,
    /// All draft children plus live-only children deleted from draft, each
    /// tagged with its [`StageDiff`] provenance.
    #[default]
    AllWithDeleted,
}

/// Draft/live provenance of a node in a with-deleted child set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StageDiff {
    /// Same on both stages, or versioning does not apply.
    #[default]
    Unchanged,
    /// Present on draft only; not yet published.
    Added,
    /// Present on both stages, with draft edits.
    Modified,
    /// Deleted from draft; the live stage still carries it.
    Deleted,
}
