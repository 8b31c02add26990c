// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Budgeted marking and nested-list rendering over a small site tree.
//!
//! This example shows the usual request lifecycle:
//! - mark a bounded partial tree from the root,
//! - expose one deeply nested node so its ancestors render open,
//! - render the marked set as `<ul>`/`<li>` markup with CSS hints.
//!
//! Run:
//! - `cargo run -p understory_demos --example outline_markup`

use understory_markup::{ItemContext, RenderOptions, render_nested_list};
use understory_outline::{
    ChildScope, MarkState, MemorySource, NodeData, NodeId, NodeKey, NodeKind, Outline, SourceError,
};

const PAGE: NodeKind = NodeKind(0);

fn key(id: u64) -> NodeKey {
    NodeKey::new(PAGE, NodeId(id))
}

/// A twelve-node site: Home with three sections, two levels deep in places.
fn site() -> MemorySource {
    let mut store = MemorySource::new();
    for (id, parent, sort, title) in [
        (1, None, 0, "Home"),
        (2, Some(1), 0, "Products"),
        (3, Some(1), 1, "Docs"),
        (4, Some(1), 2, "About"),
        (5, Some(2), 0, "Laptops"),
        (6, Some(2), 1, "Phones"),
        (7, Some(3), 0, "Install"),
        (8, Some(3), 1, "API Reference"),
        (9, Some(5), 0, "Ultralight"),
        (10, Some(5), 1, "Workstation"),
        (11, Some(8), 0, "Auth"),
        (12, Some(8), 1, "Errors"),
    ] {
        store.insert(NodeData {
            key: key(id),
            parent: parent.map(NodeId),
            sort,
            title: title.into(),
            ..NodeData::default()
        });
    }
    store
}

fn main() -> Result<(), SourceError> {
    let mut outline = Outline::new(site());
    let total = outline.source().len();
    let root = outline.load(key(1))?.expect("the root was just inserted");

    // A budgeted pass: breadth-first, so all top sections land before any
    // grandchildren do.
    let mut marks = MarkState::new();
    let marked = outline.mark_partial_tree(root, Some(6), ChildScope::All, &mut marks)?;
    println!("Marked {marked} of {total} nodes.");

    // The editor wants "Auth" visible: open every ancestor down to it.
    let auth = outline.load(key(11))?.expect("Auth is in the store");
    outline.expose_path(auth, ChildScope::All, &mut marks)?;
    println!("Exposed: {}", outline.data(auth).title);

    // Render only what is marked, with per-item expansion hints.
    let options = RenderOptions {
        scope: ChildScope::All,
        limit_to_marked: true,
        list_attributes: "class=\"site-tree\"".into(),
    };
    let list = render_nested_list(
        &mut outline,
        &mut marks,
        root,
        &options,
        |cx: &ItemContext<'_>| {
            let classes = cx.marks.marking_classes(cx.data.key);
            let id = cx.data.key.id.0;
            format!("<li id=\"node-{id}\" class=\"{classes}\">{}", cx.data.title)
        },
    )?;

    match list {
        Some(list) => println!("\n{list}"),
        None => println!("\n(nothing marked under the root)"),
    }

    // Everything fetched below Docs so far, without touching the store.
    let docs = outline.load(key(3))?.expect("Docs is in the store");
    let below_docs: Vec<u64> = outline.descendant_ids(docs).iter().map(|id| id.0).collect();
    println!("Cached descendants of Docs: {below_docs:?}");

    Ok(())
}
