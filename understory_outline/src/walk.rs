// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Natural-order traversal: the document-order "next node" search.

use smallvec::SmallVec;

use crate::outline::Outline;
use crate::source::{LiveSource, NodeSource, SourceError};
use crate::types::{ChildScope, NodeData, NodeId, NodeIdx, NodeKey, NodeVariant};

/// Boundary of a natural-order search.
///
/// The search never ascends past a boundary node: once the walk is at one
/// and has no candidates left below it, it ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalScope {
    /// Bound the walk at the node with this id.
    Node(NodeId),
    /// Bound the walk at any node of this variant.
    Variant(NodeVariant),
}

impl TraversalScope {
    /// Whether `data` is a boundary node under this scope.
    #[must_use]
    pub fn matches(self, data: &NodeData) -> bool {
        match self {
            Self::Node(id) => data.key.id == id,
            Self::Variant(variant) => data.variant == variant,
        }
    }
}

impl<S: NodeSource, L: LiveSource> Outline<S, L> {
    /// Next node in document order after `after`, searching from `from`.
    ///
    /// Document order is depth-first: a node comes before its children,
    /// children (by sort key) before their later siblings. `variant`
    /// restricts which nodes count as answers; skipped nodes are still
    /// descended through. The walk stays inside `scope` and returns
    /// `Ok(None)` when it is exhausted, including when an ancestor's parent
    /// cannot be resolved.
    ///
    /// With `after` unset, `from` itself is the first answer (when its
    /// variant matches). Passing the previous answer as both `from` and
    /// `after` resumes the walk, so the whole scope can be visited one call
    /// at a time:
    ///
    /// ```
    /// use understory_outline::{
    ///     MemorySource, NodeData, NodeId, NodeKey, NodeKind, Outline, TraversalScope,
    /// };
    ///
    /// let kind = NodeKind(0);
    /// let mut store = MemorySource::new();
    /// for (id, parent, sort) in [(1, None, 0), (2, Some(1), 0), (3, Some(1), 1)] {
    ///     store.insert(NodeData {
    ///         key: NodeKey::new(kind, NodeId(id)),
    ///         parent: parent.map(NodeId),
    ///         sort,
    ///         ..NodeData::default()
    ///     });
    /// }
    ///
    /// let mut outline = Outline::new(store);
    /// let root = outline.load(NodeKey::new(kind, NodeId(1)))?.unwrap();
    /// let scope = TraversalScope::Node(NodeId(1));
    ///
    /// let mut visited = Vec::new();
    /// let mut cursor = outline.natural_next(root, None, scope, None)?;
    /// while let Some(node) = cursor {
    ///     visited.push(outline.data(node).key.id.0);
    ///     cursor = outline.natural_next(node, None, scope, Some(node))?;
    /// }
    /// assert_eq!(visited, [1, 2, 3]);
    /// # Ok::<_, understory_outline::SourceError>(())
    /// ```
    pub fn natural_next(
        &mut self,
        from: NodeIdx,
        variant: Option<NodeVariant>,
        scope: TraversalScope,
        after: Option<NodeIdx>,
    ) -> Result<Option<NodeIdx>, SourceError> {
        let mut node = from;
        let mut after = after;
        loop {
            // When the walk just came up out of a child, the node itself
            // was visited before that child ever was.
            let came_up_from = after.filter(|&a| self.is_child_of(a, node));
            if after != Some(node) && came_up_from.is_none() && self.variant_matches(node, variant)
            {
                return Ok(Some(node));
            }

            let children = self.children_of(node, ChildScope::All)?;
            let selected: SmallVec<[NodeIdx; 8]> = match came_up_from {
                Some(prev) => {
                    // Only siblings strictly after the one we came from,
                    // ascending; equal sort keys are treated as passed.
                    let prev_sort = self.data(prev).sort;
                    let mut later: SmallVec<[NodeIdx; 8]> = children
                        .into_iter()
                        .filter(|&c| self.data(c).sort > prev_sort)
                        .collect();
                    later.sort_unstable_by_key(|&c| (self.data(c).sort, self.data(c).key.id));
                    later
                }
                None => children.into_iter().collect(),
            };
            for child in selected {
                if let Some(hit) = self.first_in_subtree(child, variant)? {
                    return Ok(Some(hit));
                }
            }

            if scope.matches(self.data(node)) {
                return Ok(None);
            }
            let Some(parent_id) = self.data(node).parent else {
                return Ok(None);
            };
            let parent_key = NodeKey::new(self.data(node).key.kind, parent_id);
            let Some(parent) = self.load(parent_key)? else {
                return Ok(None);
            };
            after = Some(node);
            node = parent;
        }
    }

    /// Previous node in document order. Not implemented: always `None`.
    ///
    /// The backward direction has not been worked out yet; this stub
    /// exists so callers probing for it get a definite "nothing" instead
    /// of an improvised mirror of [`natural_next`](Self::natural_next).
    #[must_use]
    pub fn natural_prev(
        &self,
        from: NodeIdx,
        variant: Option<NodeVariant>,
        after: Option<NodeIdx>,
    ) -> Option<NodeIdx> {
        let _ = (self, from, variant, after);
        None
    }

    /// First node in pre-order of `start`'s subtree whose variant matches,
    /// including `start` itself.
    fn first_in_subtree(
        &mut self,
        start: NodeIdx,
        variant: Option<NodeVariant>,
    ) -> Result<Option<NodeIdx>, SourceError> {
        let mut stack: SmallVec<[NodeIdx; 16]> = SmallVec::new();
        stack.push(start);
        while let Some(node) = stack.pop() {
            if self.variant_matches(node, variant) {
                return Ok(Some(node));
            }
            let children = self.children_of(node, ChildScope::All)?;
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        Ok(None)
    }

    fn is_child_of(&self, child: NodeIdx, parent: NodeIdx) -> bool {
        let child = self.data(child);
        let parent = self.data(parent);
        child.key.kind == parent.key.kind && child.parent == Some(parent.key.id)
    }

    fn variant_matches(&self, node: NodeIdx, variant: Option<NodeVariant>) -> bool {
        variant.is_none_or(|v| self.data(node).variant == v)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::source::{MemorySource, NodeSource};
    use crate::types::NodeKind;

    const KIND: NodeKind = NodeKind(0);

    fn key(id: u64) -> NodeKey {
        NodeKey::new(KIND, NodeId(id))
    }

    fn node(id: u64, parent: Option<u64>, sort: i64) -> NodeData {
        NodeData {
            key: key(id),
            parent: parent.map(NodeId),
            sort,
            title: String::from("n"),
            ..NodeData::default()
        }
    }

    /// 1=A(2=B(4=D, 5=E), 3=C)
    fn store_abcde() -> MemorySource {
        let mut store = MemorySource::new();
        store.insert(node(1, None, 0));
        store.insert(node(2, Some(1), 0));
        store.insert(node(3, Some(1), 1));
        store.insert(node(4, Some(2), 0));
        store.insert(node(5, Some(2), 1));
        store
    }

    fn walk(
        outline: &mut Outline<impl NodeSource>,
        start: NodeIdx,
        variant: Option<NodeVariant>,
        scope: TraversalScope,
    ) -> Vec<u64> {
        let mut visited = Vec::new();
        let mut cursor = outline.natural_next(start, variant, scope, None).unwrap();
        while let Some(node) = cursor {
            visited.push(outline.data(node).key.id.0);
            cursor = outline
                .natural_next(node, variant, scope, Some(node))
                .unwrap();
        }
        visited
    }

    #[test]
    fn walk_is_preorder_and_visits_each_node_once() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        let order = walk(&mut outline, root, None, TraversalScope::Node(NodeId(1)));
        assert_eq!(order, [1, 2, 4, 5, 3]);
    }

    #[test]
    fn unset_after_answers_with_the_start_itself() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        let first = outline
            .natural_next(root, None, TraversalScope::Node(NodeId(1)), None)
            .unwrap();
        assert_eq!(first, Some(root));
    }

    #[test]
    fn scope_keeps_the_walk_inside_a_subtree() {
        let mut outline = Outline::new(store_abcde());
        outline.load(key(1)).unwrap().unwrap();
        let b = outline.load(key(2)).unwrap().unwrap();
        let order = walk(&mut outline, b, None, TraversalScope::Node(NodeId(2)));
        assert_eq!(order, [2, 4, 5], "the walk must not escape into C");
    }

    #[test]
    fn variant_filter_skips_but_still_descends() {
        let mut store = store_abcde();
        store.node_mut(key(2)).unwrap().variant = NodeVariant(1);
        store.node_mut(key(5)).unwrap().variant = NodeVariant(1);
        let mut outline = Outline::new(store);
        let root = outline.load(key(1)).unwrap().unwrap();

        let order = walk(
            &mut outline,
            root,
            Some(NodeVariant(1)),
            TraversalScope::Node(NodeId(1)),
        );
        // E is reached through D even though D itself is no answer.
        assert_eq!(order, [2, 5]);
    }

    #[test]
    fn variant_scope_bounds_at_the_nearest_matching_ancestor() {
        let mut store = store_abcde();
        store.node_mut(key(2)).unwrap().variant = NodeVariant(7);
        let mut outline = Outline::new(store);
        let b = outline.load(key(2)).unwrap().unwrap();

        let order = walk(&mut outline, b, None, TraversalScope::Variant(NodeVariant(7)));
        assert_eq!(order, [2, 4, 5], "ascending past B would reach C");
    }

    #[test]
    fn unresolvable_parent_ends_the_walk() {
        let mut store = MemorySource::new();
        store.insert(node(7, Some(99), 0));
        let mut outline = Outline::new(store);
        let orphan = outline.load(key(7)).unwrap().unwrap();

        let next = outline
            .natural_next(orphan, None, TraversalScope::Node(NodeId(77)), Some(orphan))
            .unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn sibling_scan_is_strictly_after_and_ascending() {
        /// Serves children in insertion order, no sorting.
        #[derive(Debug)]
        struct Unsorted(Vec<NodeData>);

        impl NodeSource for Unsorted {
            fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError> {
                Ok(self.0.iter().find(|n| n.key == key).cloned())
            }

            fn children(
                &mut self,
                parent: NodeKey,
                _include_all: bool,
            ) -> Result<Vec<NodeData>, SourceError> {
                Ok(self
                    .0
                    .iter()
                    .filter(|n| n.key.kind == parent.kind && n.parent == Some(parent.id))
                    .cloned()
                    .collect())
            }
        }

        // Children of the root arrive as E(2), D(1), F(3).
        let store = Unsorted(
            [node(1, None, 0), node(5, Some(1), 2), node(4, Some(1), 1), node(6, Some(1), 3)]
                .into(),
        );
        let mut outline = Outline::new(store);
        outline.load(key(1)).unwrap().unwrap();
        let d = outline.load(key(4)).unwrap().unwrap();

        let next = outline
            .natural_next(d, None, TraversalScope::Node(NodeId(1)), Some(d))
            .unwrap()
            .unwrap();
        assert_eq!(outline.data(next).key.id, NodeId(5), "sort 2 comes before sort 3");
    }

    #[test]
    fn walk_fetches_parents_and_siblings_lazily() {
        let mut outline = Outline::new(store_abcde());
        let d = outline.load(key(4)).unwrap().unwrap();
        assert_eq!(outline.len(), 1);

        let next = outline
            .natural_next(d, None, TraversalScope::Node(NodeId(1)), Some(d))
            .unwrap()
            .unwrap();
        assert_eq!(outline.data(next).key.id, NodeId(5));
    }

    #[test]
    fn natural_prev_is_a_known_gap() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        assert_eq!(outline.natural_prev(root, None, None), None);
    }

    #[test]
    fn source_errors_abort_the_walk() {
        /// Resolves any node but refuses every child fetch.
        #[derive(Debug)]
        struct Failing;

        impl NodeSource for Failing {
            fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError> {
                Ok(Some(NodeData {
                    key,
                    ..NodeData::default()
                }))
            }

            fn children(
                &mut self,
                _parent: NodeKey,
                _include_all: bool,
            ) -> Result<Vec<NodeData>, SourceError> {
                Err(SourceError::UnsupportedKind(KIND))
            }
        }

        let mut outline = Outline::new(Failing);
        let root = outline.load(key(1)).unwrap().unwrap();

        let result = outline.natural_next(root, None, TraversalScope::Node(NodeId(1)), Some(root));
        assert_eq!(result, Err(SourceError::UnsupportedKind(KIND)));
    }
}
