// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The outline arena: interned nodes, per-scope child caching, and the
//! live overlay union.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::filter::MarkFilter;
use crate::source::{LiveSource, NoLive, NodeSource, SourceError};
use crate::types::{ChildScope, NodeData, NodeId, NodeIdx, NodeKey, StageDiff};

/// One interned node: payload, provenance, and child-cache slots.
#[derive(Clone, Debug)]
struct Record {
    data: NodeData,
    stage: StageDiff,
    menu_children: Option<Vec<NodeIdx>>,
    all_children: Option<Vec<NodeIdx>>,
    all_with_deleted: Option<Vec<NodeIdx>>,
}

impl Record {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            stage: StageDiff::Unchanged,
            menu_children: None,
            all_children: None,
            all_with_deleted: None,
        }
    }

    fn flush(&mut self) {
        self.menu_children = None;
        self.all_children = None;
        self.all_with_deleted = None;
    }
}

/// Lazily populated view over an externally stored hierarchy.
///
/// An `Outline` interns every node it fetches into an append-only arena and
/// memoizes child lists per [`ChildScope`], so within one outline a node has
/// exactly one [`NodeIdx`] and repeated child lookups return the same
/// indices. It owns the child sources but not the mark state: marking
/// passes receive a caller-owned [`MarkState`] by reference.
///
/// An `Outline` is request-scoped. Build one per navigation request and
/// drop it afterwards; cached child lists are *not* invalidated when the
/// underlying store changes. Call [`flush`](Self::flush) or
/// [`flush_all`](Self::flush_all) if that matters mid-request.
///
/// [`MarkState`]: crate::MarkState
pub struct Outline<S: NodeSource, L: LiveSource = NoLive> {
    source: S,
    live: L,
    records: Vec<Record>,
    by_key: HashMap<NodeKey, NodeIdx>,
    filter: MarkFilter,
}

impl<S: NodeSource> Outline<S> {
    /// Create an outline over a draft-only source.
    pub fn new(source: S) -> Self {
        Self::with_live(source, NoLive)
    }
}

impl<S: NodeSource, L: LiveSource> Outline<S, L> {
    /// Create an outline over a draft source plus a live (versioning)
    /// overlay.
    pub fn with_live(source: S, live: L) -> Self {
        Self {
            source,
            live,
            records: Vec::new(),
            by_key: HashMap::new(),
            filter: MarkFilter::All,
        }
    }

    /// The draft source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the draft source.
    ///
    /// Mutating the store does not invalidate cached child lists; flush the
    /// affected nodes when the change must become visible.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The filter consulted when marking passes admit children.
    pub fn mark_filter(&self) -> &MarkFilter {
        &self.filter
    }

    /// Replace the marking filter. Setting a new filter replaces the whole
    /// configuration; there is only ever one mode active.
    pub fn set_mark_filter(&mut self, filter: MarkFilter) {
        self.filter = filter;
    }

    /// Reset the marking filter to admit everything.
    pub fn clear_mark_filter(&mut self) {
        self.filter = MarkFilter::All;
    }

    /// Number of interned nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Intern a node payload, returning its stable index.
    ///
    /// A key seen before keeps its index and has its payload refreshed; the
    /// child-cache slots and stage tag are left alone.
    pub fn intern(&mut self, data: NodeData) -> NodeIdx {
        match self.by_key.get(&data.key) {
            Some(&idx) => {
                self.records[idx.idx()].data = data;
                idx
            }
            None => self.push_record(data),
        }
    }

    /// Resolve a key through the draft source and intern the result.
    ///
    /// A key already interned is returned as-is without consulting the
    /// source. `Ok(None)` means the store has no such node.
    pub fn load(&mut self, key: NodeKey) -> Result<Option<NodeIdx>, SourceError> {
        if let Some(&idx) = self.by_key.get(&key) {
            return Ok(Some(idx));
        }
        let fetched = self.source.node(key)?;
        Ok(fetched.map(|data| self.push_record(data)))
    }

    /// Index of an already-interned key, if any.
    #[must_use]
    pub fn lookup(&self, key: NodeKey) -> Option<NodeIdx> {
        self.by_key.get(&key).copied()
    }

    /// Payload of an interned node.
    ///
    /// Indices issued by this outline are always valid (nothing is ever
    /// removed); passing an index from a different outline is a logic error
    /// and may panic.
    #[must_use]
    pub fn data(&self, idx: NodeIdx) -> &NodeData {
        &self.records[idx.idx()].data
    }

    /// Draft/live provenance recorded for `idx` by the most recent
    /// with-deleted fetch; [`StageDiff::Unchanged`] until then.
    #[must_use]
    pub fn stage_of(&self, idx: NodeIdx) -> StageDiff {
        self.records[idx.idx()].stage
    }

    /// Children of `idx` under `scope`, fetching and interning on first use.
    ///
    /// Results are memoized per scope slot: repeated calls return the same
    /// indices without touching the sources. Cache temperature never changes
    /// what is returned, only whether the sources are consulted.
    pub fn children_of(
        &mut self,
        idx: NodeIdx,
        scope: ChildScope,
    ) -> Result<Vec<NodeIdx>, SourceError> {
        if let Some(cached) = self.cached_children(idx, scope) {
            return Ok(cached.to_vec());
        }
        let list = match scope {
            ChildScope::Menu => self.fetch_menu(idx)?,
            ChildScope::All => self.fetch_all(idx)?,
            ChildScope::AllWithDeleted => self.fetch_all_with_deleted(idx)?,
        };
        *self.slot_mut(idx, scope) = Some(list.clone());
        Ok(list)
    }

    /// The cached child list for `scope`, if that slot has been filled.
    #[must_use]
    pub fn cached_children(&self, idx: NodeIdx, scope: ChildScope) -> Option<&[NodeIdx]> {
        let record = &self.records[idx.idx()];
        match scope {
            ChildScope::Menu => record.menu_children.as_deref(),
            ChildScope::All => record.all_children.as_deref(),
            ChildScope::AllWithDeleted => record.all_with_deleted.as_deref(),
        }
    }

    /// Drop `idx`'s cached child lists, all three scopes. Interned payloads
    /// and any mark state are untouched.
    pub fn flush(&mut self, idx: NodeIdx) {
        self.records[idx.idx()].flush();
    }

    /// Drop every node's cached child lists.
    pub fn flush_all(&mut self) {
        for record in &mut self.records {
            record.flush();
        }
    }

    /// Ids of every descendant reachable through *already cached*
    /// all-children slots, depth-first, without touching the sources.
    ///
    /// Duplicate ids are skipped together with their subtrees, guarding
    /// against duplicated child entries, not against cycles. The starting
    /// node's own id is not included. Subtrees never fetched contribute
    /// nothing; run a marking pass or otherwise warm the cache first when
    /// the full set is wanted.
    #[must_use]
    pub fn descendant_ids(&self, idx: NodeIdx) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut stack: SmallVec<[NodeIdx; 16]> = SmallVec::new();
        if let Some(children) = self.records[idx.idx()].all_children.as_deref() {
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        while let Some(cur) = stack.pop() {
            let id = self.records[cur.idx()].data.key.id;
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(children) = self.records[cur.idx()].all_children.as_deref() {
                for &child in children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    // --- internals ---

    fn push_record(&mut self, data: NodeData) -> NodeIdx {
        let idx = NodeIdx::new(self.records.len());
        self.by_key.insert(data.key, idx);
        self.records.push(Record::new(data));
        idx
    }

    fn slot_mut(&mut self, idx: NodeIdx, scope: ChildScope) -> &mut Option<Vec<NodeIdx>> {
        let record = &mut self.records[idx.idx()];
        match scope {
            ChildScope::Menu => &mut record.menu_children,
            ChildScope::All => &mut record.all_children,
            ChildScope::AllWithDeleted => &mut record.all_with_deleted,
        }
    }

    fn fetch_menu(&mut self, idx: NodeIdx) -> Result<Vec<NodeIdx>, SourceError> {
        let key = self.records[idx.idx()].data.key;
        let fetched = self.source.children(key, false)?;
        let mut out = Vec::with_capacity(fetched.len());
        for data in fetched {
            if !self.source.can_view(data.key) {
                continue;
            }
            out.push(self.intern(data));
        }
        Ok(out)
    }

    fn fetch_all(&mut self, idx: NodeIdx) -> Result<Vec<NodeIdx>, SourceError> {
        let key = self.records[idx.idx()].data.key;
        let fetched = self.source.children(key, true)?;
        Ok(fetched.into_iter().map(|data| self.intern(data)).collect())
    }

    fn fetch_all_with_deleted(&mut self, idx: NodeIdx) -> Result<Vec<NodeIdx>, SourceError> {
        let key = self.records[idx.idx()].data.key;
        let versioned = self.live.has_versioning(key);
        let mut out = Vec::new();
        for data in self.source.children(key, true)? {
            let child_key = data.key;
            let child = self.intern(data);
            if versioned {
                let stage = self.live.stage_state(child_key);
                self.records[child.idx()].stage = stage;
            }
            out.push(child);
        }
        if versioned {
            // Live-only children (deleted from draft) come after the draft
            // set, per the union's contract.
            for data in self.live.live_children(key, true, true)? {
                let child = self.intern(data);
                self.records[child.idx()].stage = StageDiff::Deleted;
                out.push(child);
            }
        }
        Ok(out)
    }
}

impl<S: NodeSource, L: LiveSource> fmt::Debug for Outline<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outline")
            .field("nodes", &self.records.len())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::source::MemorySource;
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

    #[test]
    fn intern_is_idempotent_and_refreshes_payload() {
        let mut outline = Outline::new(MemorySource::new());
        let a = outline.intern(node(1, None, 0));
        let mut updated = node(1, None, 7);
        updated.title = String::from("renamed");
        let b = outline.intern(updated);

        assert_eq!(a, b);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline.data(a).sort, 7);
        assert_eq!(outline.data(a).title, "renamed");
    }

    #[test]
    fn load_interns_once_and_reports_missing() {
        let mut outline = Outline::new(store_abcde());
        let a = outline.load(key(1)).unwrap().unwrap();
        let again = outline.load(key(1)).unwrap().unwrap();
        assert_eq!(a, again);
        assert_eq!(outline.lookup(key(1)), Some(a));
        assert_eq!(outline.load(key(99)).unwrap(), None);
    }

    #[test]
    fn children_identity_is_stable() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        let first = outline.children_of(root, ChildScope::All).unwrap();
        let second = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        // The same nodes resolve to the same indices by key too.
        assert_eq!(outline.lookup(key(2)), Some(first[0]));
        assert_eq!(outline.lookup(key(3)), Some(first[1]));
    }

    #[test]
    fn cache_serves_stale_until_flush() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        let before = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(before.len(), 2);

        outline.source_mut().insert(node(6, Some(1), 2));
        let cached = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(cached, before, "cached slot must not see the new child");

        outline.flush(root);
        assert!(outline.cached_children(root, ChildScope::All).is_none());
        let after = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(after.len(), 3);
        // The surviving children keep their indices.
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn scope_slots_are_independent() {
        let mut store = store_abcde();
        store.node_mut(key(3)).unwrap().in_menus = false;
        let mut outline = Outline::new(store);
        let root = outline.load(key(1)).unwrap().unwrap();

        let menu = outline.children_of(root, ChildScope::Menu).unwrap();
        let all = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(all.len(), 2);
        assert!(outline.cached_children(root, ChildScope::Menu).is_some());
        assert!(outline.cached_children(root, ChildScope::All).is_some());
        assert!(
            outline
                .cached_children(root, ChildScope::AllWithDeleted)
                .is_none()
        );
    }

    #[test]
    fn can_view_applies_to_menu_scope_only() {
        /// Denies viewing of one id, serves everything otherwise.
        #[derive(Debug)]
        struct Gated {
            inner: MemorySource,
            denied: NodeId,
        }

        impl NodeSource for Gated {
            fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError> {
                self.inner.node(key)
            }

            fn children(
                &mut self,
                parent: NodeKey,
                include_all: bool,
            ) -> Result<Vec<NodeData>, SourceError> {
                self.inner.children(parent, include_all)
            }

            fn can_view(&mut self, key: NodeKey) -> bool {
                key.id != self.denied
            }
        }

        let mut outline = Outline::new(Gated {
            inner: store_abcde(),
            denied: NodeId(2),
        });
        let root = outline.load(key(1)).unwrap().unwrap();

        let menu = outline.children_of(root, ChildScope::Menu).unwrap();
        let menu_ids: Vec<u64> = menu.iter().map(|&c| outline.data(c).key.id.0).collect();
        assert_eq!(menu_ids, [3]);

        let all = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(all.len(), 2, "permissions must not touch the All scope");
    }

    #[test]
    fn with_deleted_unions_live_and_tags_provenance() {
        /// One deleted child under the root, one modified draft node.
        #[derive(Debug)]
        struct Stage {
            deleted_parent: NodeKey,
            deleted: NodeData,
            modified: NodeId,
        }

        impl LiveSource for Stage {
            fn has_versioning(&self, _key: NodeKey) -> bool {
                true
            }

            fn live_children(
                &mut self,
                parent: NodeKey,
                _include_all: bool,
                only_missing_from_draft: bool,
            ) -> Result<Vec<NodeData>, SourceError> {
                assert!(only_missing_from_draft);
                if parent == self.deleted_parent {
                    Ok(vec![self.deleted.clone()])
                } else {
                    Ok(Vec::new())
                }
            }

            fn stage_state(&mut self, key: NodeKey) -> StageDiff {
                if key.id == self.modified {
                    StageDiff::Modified
                } else {
                    StageDiff::Unchanged
                }
            }
        }

        let stage = Stage {
            deleted_parent: key(1),
            deleted: node(9, Some(1), 5),
            modified: NodeId(2),
        };
        let mut outline = Outline::with_live(store_abcde(), stage);
        let root = outline.load(key(1)).unwrap().unwrap();

        let children = outline
            .children_of(root, ChildScope::AllWithDeleted)
            .unwrap();
        let ids: Vec<u64> = children.iter().map(|&c| outline.data(c).key.id.0).collect();
        assert_eq!(ids, [2, 3, 9], "live-only children come after the draft set");

        assert_eq!(outline.stage_of(children[0]), StageDiff::Modified);
        assert_eq!(outline.stage_of(children[1]), StageDiff::Unchanged);
        assert_eq!(outline.stage_of(children[2]), StageDiff::Deleted);
    }

    #[test]
    fn no_live_keeps_with_deleted_pure_draft() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        let children = outline
            .children_of(root, ChildScope::AllWithDeleted)
            .unwrap();
        assert_eq!(children.len(), 2);
        for &child in &children {
            assert_eq!(outline.stage_of(child), StageDiff::Unchanged);
        }
    }

    #[test]
    fn descendant_ids_walks_cached_slots_only() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        assert!(outline.descendant_ids(root).is_empty());

        outline.children_of(root, ChildScope::All).unwrap();
        let shallow: Vec<u64> = outline.descendant_ids(root).iter().map(|id| id.0).collect();
        assert_eq!(shallow, [2, 3], "grandchildren are uncached so far");

        let b = outline.lookup(key(2)).unwrap();
        outline.children_of(b, ChildScope::All).unwrap();
        let deep: Vec<u64> = outline.descendant_ids(root).iter().map(|id| id.0).collect();
        assert_eq!(deep, [2, 4, 5, 3], "depth-first, pre-order, self excluded");
    }

    #[test]
    fn descendant_ids_skips_duplicate_entries() {
        /// Serves the same child twice for one parent.
        #[derive(Debug)]
        struct Doubling(MemorySource);

        impl NodeSource for Doubling {
            fn node(&mut self, key: NodeKey) -> Result<Option<NodeData>, SourceError> {
                self.0.node(key)
            }

            fn children(
                &mut self,
                parent: NodeKey,
                include_all: bool,
            ) -> Result<Vec<NodeData>, SourceError> {
                let mut out = self.0.children(parent, include_all)?;
                let dup: Vec<NodeData> = out.clone();
                out.extend(dup);
                Ok(out)
            }
        }

        let mut store = MemorySource::new();
        store.insert(node(1, None, 0));
        store.insert(node(2, Some(1), 0));
        let mut outline = Outline::new(Doubling(store));
        let root = outline.load(key(1)).unwrap().unwrap();

        let children = outline.children_of(root, ChildScope::All).unwrap();
        assert_eq!(children.len(), 2, "duplicate entries share one index");
        assert_eq!(children[0], children[1]);

        let ids: Vec<u64> = outline.descendant_ids(root).iter().map(|id| id.0).collect();
        assert_eq!(ids, [2]);
    }

    #[test]
    fn flush_all_clears_every_slot() {
        let mut outline = Outline::new(store_abcde());
        let root = outline.load(key(1)).unwrap().unwrap();
        outline.children_of(root, ChildScope::All).unwrap();
        let b = outline.lookup(key(2)).unwrap();
        outline.children_of(b, ChildScope::Menu).unwrap();

        outline.flush_all();
        assert!(outline.cached_children(root, ChildScope::All).is_none());
        assert!(outline.cached_children(b, ChildScope::Menu).is_none());
    }
}
