//! Diagram tree, transform and view.
//!
//! The transform turns heading-only markdown into a [`DiagramNode`] tree. The
//! view lays the tree out and owns pan/zoom, folds and animations. Node
//! objects are recreated on every data replacement; the path stored in each
//! node's payload is the identity that survives.

pub mod geometry;
mod mindmap;
mod transform;
mod view;

pub use geometry::{Point, Rect, Size, Transform};
pub use mindmap::{MindmapView, NodeId, RenderedNode};
pub use transform::{HeadingTransformer, Transformer};
pub use view::DiagramView;

use crate::outline::PATH_SEPARATOR;
use crate::parser::utils::decode_markup;
use serde::Serialize;

/// Data the engine attaches to a diagram node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// Outline path, assigned by [`annotate`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Collapsed state
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fold: bool,
}

/// A node of the diagram tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagramNode {
    /// Node text as markup (entities escaped, may carry inline tags)
    pub content: String,
    /// Distance from the root
    pub depth: usize,
    pub payload: Payload,
    pub children: Vec<DiagramNode>,
}

impl DiagramNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<DiagramNode>) -> Self {
        self.children = children;
        self
    }

    /// Recompute `depth` for the whole subtree, starting at `depth`.
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth(depth + 1);
        }
    }

    /// Visit every node in preorder.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a DiagramNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut DiagramNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// First node in preorder whose path is `path`.
    pub fn find(&self, path: &str) -> Option<&DiagramNode> {
        if self.payload.path.as_deref() == Some(path) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut DiagramNode> {
        if self.payload.path.as_deref() == Some(path) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(path))
    }

    /// Decoded plain text of the node.
    pub fn text(&self) -> String {
        decode_markup(&self.content).into_owned()
    }

    /// Number of nodes in the subtree.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(DiagramNode::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.children.is_empty()
    }
}

/// Assign an outline path to every node with content.
///
/// Contentless nodes (such as a grouping root) pass their parent's path
/// through and get none themselves.
pub fn annotate(root: &mut DiagramNode) {
    annotate_with_parent(root, None);
}

fn annotate_with_parent(node: &mut DiagramNode, parent: Option<&str>) {
    let own = if node.content.is_empty() {
        None
    } else {
        let decoded = decode_markup(&node.content);
        Some(match parent {
            Some(parent) if !parent.is_empty() => {
                format!("{parent}{PATH_SEPARATOR}{decoded}")
            }
            _ => decoded.into_owned(),
        })
    };
    node.payload.path = own.clone();

    let through = own.as_deref().or(parent);
    for child in &mut node.children {
        annotate_with_parent(child, through);
    }
}
