// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_outline --heading-base-level=0

//! Understory Outline: budgeted partial-tree marking and lazy traversal.
//!
//! Understory Outline is a reusable building block for tree-style browsing over hierarchies
//! too large to fetch whole.
//!
//! - Marks a bounded partial tree breadth-first from a root, so an initial view stays balanced
//!   no matter how deep or wide the full hierarchy is.
//! - Walks nodes in document order lazily, fetching parents and siblings only as the walk
//!   reaches them.
//! - Memoizes child fetches per node and scope, so marking, traversal, and rendering passes
//!   agree on node identity without refetching.
//!
//! ## Where this fits
//!
//! The outline sits between a node store and a tree UI. Storage, versioning, and permission
//! checks stay outside, behind the [`NodeSource`] and [`LiveSource`] traits; the outline owns
//! the traversal state: which nodes have been seen, which are marked for display, and which
//! child lists are already known. Rendering sits above and is served by `understory_markup`.
//!
//! Marking state is a caller-owned [`MarkState`] value rather than anything global. Two
//! requests over the same store never share marks unless they share the value.
//!
//! ## Not a storage layer
//!
//! This crate does not persist nodes, does not compute diffs between versioned copies, and is
//! not a general graph library. It assumes rooted trees: parent links that cycle are a caller
//! error. Nodes are addressed by [`NodeKey`] (kind plus id) and described by the plain
//! [`NodeData`] record; whatever else a node carries stays in the store.
//!
//! ## API overview
//!
//! - [`Outline`]: the arena of fetched nodes plus the per-node child cache.
//! - [`NodeSource`]: draft-stage node and child fetching; [`MemorySource`] is the in-memory
//!   implementation. [`LiveSource`] optionally overlays a published ("live") stage.
//! - [`MarkState`]: marked/expanded/opened flags and the marked set of one pass.
//! - [`MarkFilter`]: restricts which children a marking pass admits.
//! - [`ChildScope`]: which child set to fetch (menu, all, or all including deleted).
//! - [`TraversalScope`]: bounds a document-order walk.
//!
//! Key operations:
//! - [`Outline::load`] / [`Outline::children_of`] fetch through the cache.
//! - [`Outline::mark_partial_tree`] marks up to a budget of nodes; [`DEFAULT_NODE_BUDGET`]
//!   applies when none is given.
//! - [`Outline::mark_by_id`] / [`Outline::expose_path`] re-expand and open marked nodes.
//! - [`Outline::natural_next`] finds the next node in document order.
//! - [`Outline::descendant_ids`] collects ids from already-cached child lists.
//! - [`Outline::flush`] / [`Outline::flush_all`] drop cached child lists.
//!
//! # Example
//!
//! ```rust
//! use understory_outline::{
//!     ChildScope, MarkState, MemorySource, NodeData, NodeId, NodeKey, NodeKind, Outline,
//! };
//!
//! // A small site tree: Home with two sections, one of which has a child.
//! let kind = NodeKind(0);
//! let mut store = MemorySource::new();
//! for (id, parent, title) in [
//!     (1, None, "Home"),
//!     (2, Some(1), "About"),
//!     (3, Some(1), "Docs"),
//!     (4, Some(3), "Install"),
//! ] {
//!     store.insert(NodeData {
//!         key: NodeKey::new(kind, NodeId(id)),
//!         parent: parent.map(NodeId),
//!         title: title.into(),
//!         ..NodeData::default()
//!     });
//! }
//!
//! let mut outline = Outline::new(store);
//! let root = outline.load(NodeKey::new(kind, NodeId(1)))?.unwrap();
//!
//! // Mark a budgeted partial tree; the state belongs to this request.
//! let mut marks = MarkState::new();
//! let marked = outline.mark_partial_tree(root, Some(3), ChildScope::All, &mut marks)?;
//! assert_eq!(marked, 3);
//!
//! // "Docs" was admitted, but its subtree was not descended into.
//! assert!(marks.is_marked(NodeKey::new(kind, NodeId(3))));
//! assert!(!marks.is_expanded(NodeKey::new(kind, NodeId(3))));
//! assert!(!marks.is_marked(NodeKey::new(kind, NodeId(4))));
//! # Ok::<_, understory_outline::SourceError>(())
//! ```
//!
//! ## Demos
//!
//! - `demos/examples/outline_markup.rs`: marks a budgeted tree, exposes a deep node, and
//!   renders the result as a nested list.
//! - `demos/examples/outline_walk.rs`: steps through a tree in document order, with and
//!   without a variant filter.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod filter;
mod mark;
mod outline;
mod source;
mod types;
mod walk;

pub use filter::{FieldValue, MarkFilter, NodeField};
pub use mark::{DEFAULT_NODE_BUDGET, MarkFlags, MarkState};
pub use outline::Outline;
pub use source::{LiveSource, MemorySource, NoLive, NodeSource, SourceError};
pub use types::{ChildScope, NodeData, NodeId, NodeIdx, NodeKey, NodeKind, NodeVariant, StageDiff};
pub use walk::TraversalScope;
