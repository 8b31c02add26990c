// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document-order traversal with and without a variant filter.
//!
//! The walk fetches lazily: parents and later siblings are pulled from the
//! source only when the cursor reaches them, so stepping through a huge
//! tree costs no more than the nodes actually visited.
//!
//! Run:
//! - `cargo run -p understory_demos --example outline_walk`

use understory_outline::{
    MemorySource, NodeData, NodeId, NodeIdx, NodeKey, NodeKind, NodeVariant, Outline, SourceError,
    TraversalScope,
};

const PAGE: NodeKind = NodeKind(0);

const ARTICLE: NodeVariant = NodeVariant(0);
const FOLDER: NodeVariant = NodeVariant(1);

fn key(id: u64) -> NodeKey {
    NodeKey::new(PAGE, NodeId(id))
}

/// A guide with two folder sections holding articles.
fn guide() -> MemorySource {
    let mut store = MemorySource::new();
    for (id, parent, sort, variant, title) in [
        (1, None, 0, ARTICLE, "Guide"),
        (2, Some(1), 0, FOLDER, "Basics"),
        (3, Some(1), 1, FOLDER, "Advanced"),
        (4, Some(2), 0, ARTICLE, "Install"),
        (5, Some(2), 1, ARTICLE, "Config"),
        (6, Some(3), 0, ARTICLE, "Tuning"),
    ] {
        store.insert(NodeData {
            key: key(id),
            parent: parent.map(NodeId),
            sort,
            variant,
            title: title.into(),
            ..NodeData::default()
        });
    }
    store
}

/// Step the walk to exhaustion, collecting titles.
fn titles(
    outline: &mut Outline<MemorySource>,
    start: NodeIdx,
    variant: Option<NodeVariant>,
    scope: TraversalScope,
) -> Result<Vec<String>, SourceError> {
    let mut out = Vec::new();
    let mut cursor = outline.natural_next(start, variant, scope, None)?;
    while let Some(node) = cursor {
        out.push(outline.data(node).title.clone());
        cursor = outline.natural_next(node, variant, scope, Some(node))?;
    }
    Ok(out)
}

fn main() -> Result<(), SourceError> {
    let mut outline = Outline::new(guide());
    let root = outline.load(key(1))?.expect("the root was just inserted");
    let scope = TraversalScope::Node(NodeId(1));

    println!("Document order: {:?}", titles(&mut outline, root, None, scope)?);
    println!(
        "Folders only:   {:?}",
        titles(&mut outline, root, Some(FOLDER), scope)?
    );

    // Bound the walk to one section: it never escapes into "Advanced".
    let basics = outline.load(key(2))?.expect("Basics is in the store");
    println!(
        "Inside Basics:  {:?}",
        titles(&mut outline, basics, None, TraversalScope::Node(NodeId(2)))?
    );

    Ok(())
}
