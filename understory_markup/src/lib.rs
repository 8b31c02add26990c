// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_markup --heading-base-level=0

//! Understory Markup: nested-list rendering for partially marked outlines.
//!
//! Understory Markup turns the child structure an [`Outline`] has already learned into
//! `<ul>`/`<li>` markup, one item per node, nested lists for subtrees.
//!
//! - Renders a node's children (not the node itself), depth-first, through the outline's
//!   child cache.
//! - Optionally limits output to nodes a marking pass admitted, so a budgeted partial tree
//!   renders as a partial list.
//! - Leaves item content to a caller-supplied closure; [`default_title`] produces a bare
//!   `<li>` with the node title.
//!
//! ## Where this fits
//!
//! This sits directly above `understory_outline`: marking decides *which* nodes a request
//! shows, this crate decides what that set looks like as markup. It emits structure only;
//! escaping, ids, and styling belong to the title closure, which sees each node's data,
//! its draft/live stage, and the mark state (for [`MarkState::marking_classes`] hints).
//!
//! # Example
//!
//! ```rust
//! use understory_markup::{RenderOptions, default_title, render_nested_list};
//! use understory_outline::{
//!     ChildScope, MarkState, MemorySource, NodeData, NodeId, NodeKey, NodeKind, Outline,
//! };
//!
//! let kind = NodeKind(0);
//! let mut store = MemorySource::new();
//! for (id, parent, title) in [(1, None, "Home"), (2, Some(1), "About"), (3, Some(1), "Docs")] {
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
//! let mut marks = MarkState::new();
//!
//! let options = RenderOptions {
//!     scope: ChildScope::All,
//!     ..RenderOptions::default()
//! };
//! let list = render_nested_list(&mut outline, &mut marks, root, &options, default_title)?;
//! assert_eq!(
//!     list.as_deref(),
//!     Some("<ul>\n<li>About\n</li>\n<li>Docs\n</li>\n</ul>\n")
//! );
//! # Ok::<_, understory_outline::SourceError>(())
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use understory_outline::{
    ChildScope, LiveSource, MarkState, NodeData, NodeIdx, NodeSource, Outline, SourceError,
    StageDiff,
};

/// What the title closure sees for each rendered node.
#[derive(Debug)]
pub struct ItemContext<'a> {
    /// The node being rendered.
    pub data: &'a NodeData,
    /// Draft/live provenance recorded for the node, if a with-deleted fetch
    /// ran; [`StageDiff::Unchanged`] otherwise.
    pub stage: StageDiff,
    /// The mark state of the rendering request, for
    /// [`MarkState::marking_classes`] and the flag queries.
    pub marks: &'a MarkState,
}

/// Options for [`render_nested_list`].
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Which child set to render. Defaults to
    /// [`ChildScope::AllWithDeleted`], matching what tree editors show.
    pub scope: ChildScope,
    /// Render only nodes the mark state has marked. Defaults to `false`.
    pub limit_to_marked: bool,
    /// Attributes spliced into the outermost `<ul>`, for example
    /// `class="tree"`. Nested lists are always bare. Defaults to empty.
    pub list_attributes: String,
}

/// The plainest item opener: `<li>` followed by the node title, unescaped.
#[must_use]
pub fn default_title(cx: &ItemContext<'_>) -> String {
    format!("<li>{}", cx.data.title)
}

/// One list being assembled; its `</li>`s are owed by the parent frame.
struct Frame {
    children: Vec<NodeIdx>,
    next: usize,
    buf: String,
    found: bool,
}

impl Frame {
    fn new(children: Vec<NodeIdx>) -> Self {
        Self {
            children,
            next: 0,
            buf: String::new(),
            found: false,
        }
    }
}

fn close_frame(frame: Frame, attributes: &str) -> Option<String> {
    if !frame.found {
        return None;
    }
    let mut list = String::from("<ul");
    if !attributes.is_empty() {
        list.push(' ');
        list.push_str(attributes);
    }
    list.push_str(">\n");
    list.push_str(&frame.buf);
    list.push_str("</ul>\n");
    Some(list)
}

/// Render `root`'s children as nested `<ul>`/`<li>` markup.
///
/// Each eligible child contributes the `title` closure's output, a newline,
/// a nested list when it has eligible children of its own, and a closing
/// `</li>`. A node whose children were never fetched under
/// `options.scope` is fetched here, through the outline's cache, so a
/// render after a marking pass reuses the marking pass's fetches.
///
/// With `options.limit_to_marked` set, unmarked nodes are omitted along
/// with their subtrees, and the childless-node expansion fixup
/// ([`Outline::finish_marking`]) runs first so the hints the closure reads
/// are consistent.
///
/// Returns `Ok(None)` when no child was eligible; callers should render
/// nothing in that case.
pub fn render_nested_list<S, L, F>(
    outline: &mut Outline<S, L>,
    marks: &mut MarkState,
    root: NodeIdx,
    options: &RenderOptions,
    mut title: F,
) -> Result<Option<String>, SourceError>
where
    S: NodeSource,
    L: LiveSource,
    F: FnMut(&ItemContext<'_>) -> String,
{
    if options.limit_to_marked {
        outline.finish_marking(marks);
    }

    let root_children = outline.children_of(root, options.scope)?;
    let mut stack: Vec<Frame> = Vec::new();
    stack.push(Frame::new(root_children));

    // The stack mirrors the list nesting; the bottom frame is the root's.
    loop {
        let picked = {
            let Some(frame) = stack.last_mut() else { break };
            let mut picked = None;
            while frame.next < frame.children.len() {
                let child = frame.children[frame.next];
                frame.next += 1;
                if !options.limit_to_marked || marks.is_marked(outline.data(child).key) {
                    picked = Some(child);
                    break;
                }
            }
            picked
        };

        match picked {
            Some(child) => {
                let opener = {
                    let cx = ItemContext {
                        data: outline.data(child),
                        stage: outline.stage_of(child),
                        marks: &*marks,
                    };
                    title(&cx)
                };
                if let Some(frame) = stack.last_mut() {
                    frame.found = true;
                    frame.buf.push_str(&opener);
                    frame.buf.push('\n');
                }
                let children = outline.children_of(child, options.scope)?;
                stack.push(Frame::new(children));
            }
            None => {
                let Some(frame) = stack.pop() else { break };
                let closed = close_frame(
                    frame,
                    if stack.is_empty() {
                        &options.list_attributes
                    } else {
                        ""
                    },
                );
                match stack.last_mut() {
                    Some(parent) => {
                        if let Some(list) = &closed {
                            parent.buf.push_str(list);
                        }
                        parent.buf.push_str("</li>\n");
                    }
                    None => return Ok(closed),
                }
            }
        }
    }
    Ok(None)
}
