use crate::config::DiagramOptions;
use crate::diagram::{DiagramNode, Rect, Size, Transform};
use crate::error::Result;
use std::fmt::Debug;
use std::time::Duration;

/// A rendered, interactive diagram.
///
/// The view owns node layout, folding, pan/zoom and animations. Node handles
/// are only valid until the next [`set_data`](DiagramView::set_data) or
/// [`toggle_node`](DiagramView::toggle_node).
pub trait DiagramView: Sized {
    type Node: Copy + Eq + Debug;

    fn create(options: &DiagramOptions, root: DiagramNode) -> Result<Self>;

    /// Replace the tree. Folds stored in the new tree's payloads are honored.
    fn set_data(&mut self, root: DiagramNode, options: &DiagramOptions) -> Result<()>;

    /// The current tree, with up-to-date fold state.
    fn data(&self) -> Option<&DiagramNode>;

    /// The rendered node with outline path `path`.
    ///
    /// Nodes hidden under a folded ancestor are not rendered.
    fn find_node(&self, path: &str) -> Option<Self::Node>;

    fn node_path(&self, node: Self::Node) -> Option<&str>;

    /// Bounding box of a rendered node on the surface, under the current transform.
    fn node_rect(&self, node: Self::Node) -> Option<Rect>;

    /// Flip the fold state of the node at `path`. Returns the new state.
    fn toggle_node(&mut self, path: &str) -> Option<bool>;

    /// Pan and zoom so the whole diagram fits the surface.
    fn fit(&mut self);

    /// The pan/zoom transform, as of the end of any running animation.
    fn current_transform(&self) -> Transform;

    fn apply_transform(&mut self, transform: Transform, duration: Duration);

    /// Size of the drawing surface.
    fn surface(&self) -> Size;

    /// Pulse the node's background to `color` and back over `duration`.
    fn highlight_node(&mut self, node: Self::Node, color: &str, duration: Duration);
}
