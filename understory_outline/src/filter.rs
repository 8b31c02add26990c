// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marking filters: which children a marking pass admits.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::types::{NodeData, NodeId, NodeVariant};

/// A filterable attribute of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeField {
    /// The node's variant tag.
    Variant,
    /// The node's id.
    Id,
    /// The parent id; a tree root (absent parent) matches no value.
    Parent,
    /// The sibling sort key.
    Sort,
    /// The menu-visibility flag.
    InMenus,
    /// The display title.
    Title,
}

/// A value a [`NodeField`] is compared against.
///
/// Values are typed; comparing a field against a value of the wrong shape
/// never matches (it is not an error).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A variant tag, for [`NodeField::Variant`].
    Variant(NodeVariant),
    /// An id, for [`NodeField::Id`] and [`NodeField::Parent`].
    Id(NodeId),
    /// An integer, for [`NodeField::Sort`].
    Int(i64),
    /// A boolean, for [`NodeField::InMenus`].
    Bool(bool),
    /// A string, for [`NodeField::Title`].
    Text(String),
}

/// Restricts which children a marking pass admits.
///
/// Exactly one mode is active at a time; replacing the filter replaces the
/// whole configuration, and [`MarkFilter::All`] is the explicit "no filter".
/// The root of a marking pass is never filtered, only children under
/// consideration.
#[derive(Clone, Debug, Default)]
pub enum MarkFilter {
    /// Admit every child.
    #[default]
    All,
    /// Admit children whose `field` equals any of `any_of`.
    Field {
        /// The attribute to compare.
        field: NodeField,
        /// Accepted values.
        any_of: Vec<FieldValue>,
    },
    /// Admit children satisfying the predicate.
    Where(fn(&NodeData) -> bool),
}

impl MarkFilter {
    /// Admit children whose `field` equals `value`.
    #[must_use]
    pub fn field_equals(field: NodeField, value: FieldValue) -> Self {
        Self::Field {
            field,
            any_of: vec![value],
        }
    }

    /// Admit children whose `field` equals any of `values`.
    #[must_use]
    pub fn field_in(field: NodeField, values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self::Field {
            field,
            any_of: values.into_iter().collect(),
        }
    }

    /// Admit children satisfying `predicate`.
    #[must_use]
    pub const fn where_fn(predicate: fn(&NodeData) -> bool) -> Self {
        Self::Where(predicate)
    }

    /// Whether `node` passes this filter.
    #[must_use]
    pub fn matches(&self, node: &NodeData) -> bool {
        match self {
            Self::All => true,
            Self::Field { field, any_of } => {
                any_of.iter().any(|v| field_matches(*field, v, node))
            }
            Self::Where(predicate) => predicate(node),
        }
    }
}

fn field_matches(field: NodeField, value: &FieldValue, node: &NodeData) -> bool {
    match (field, value) {
        (NodeField::Variant, FieldValue::Variant(v)) => node.variant == *v,
        (NodeField::Id, FieldValue::Id(id)) => node.key.id == *id,
        (NodeField::Parent, FieldValue::Id(id)) => node.parent == Some(*id),
        (NodeField::Sort, FieldValue::Int(sort)) => node.sort == *sort,
        (NodeField::InMenus, FieldValue::Bool(flag)) => node.in_menus == *flag,
        (NodeField::Title, FieldValue::Text(text)) => node.title == *text,
        _ => false,
    }
}
