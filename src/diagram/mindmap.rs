//! Laid-out mindmap: a horizontal tree, root on the left.
//!
//! Only nodes that are not hidden under a folded ancestor are laid out.
//! Leaves are stacked in rows; a parent is centered on its children.

use crate::config::DiagramOptions;
use crate::diagram::geometry::ease_cubic;
use crate::diagram::{DiagramNode, DiagramView, Rect, Size, Transform};
use crate::error::{Error, Result};
use indextree::Arena;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

pub use indextree::NodeId;

/// A node as laid out on the surface, in diagram space.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub path: Option<String>,
    /// Decoded text
    pub text: String,
    pub depth: usize,
    pub fold: bool,
    pub has_children: bool,
    /// Index into the branch color list
    pub color: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: Transform,
    start: Instant,
    duration: Duration,
}

#[derive(Debug, Clone)]
struct NodeHighlight {
    path: String,
    color: String,
    until: Instant,
}

pub struct MindmapView {
    options: DiagramOptions,
    data: DiagramNode,
    arena: Arena<RenderedNode>,
    root: Option<NodeId>,
    order: Vec<NodeId>,
    bounds: Rect,
    surface: Size,
    transform: Transform,
    animation: Option<Animation>,
    highlight: Option<NodeHighlight>,
    revision: u64,
}

impl MindmapView {
    /// Rendered nodes in preorder.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &RenderedNode)> {
        self.order.iter().map(|&id| (id, self.arena[id].get()))
    }

    pub fn node(&self, node: NodeId) -> Option<&RenderedNode> {
        self.arena.get(node).map(|n| n.get())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|n| n.parent())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bounding box of all rendered nodes, in diagram space.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn options(&self) -> &DiagramOptions {
        &self.options
    }

    /// Resize the drawing surface and snap to a fit, without animating.
    pub fn set_surface(&mut self, surface: Size) {
        self.surface = surface;
        self.animation = None;
        self.transform = self.fit_transform();
    }

    /// Incremented on every data replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The transform to draw with at `now`, part-way through any animation.
    pub fn display_transform(&self, now: Instant) -> Transform {
        match self.animation {
            Some(anim) if !anim.duration.is_zero() => {
                let elapsed = now.saturating_duration_since(anim.start);
                if elapsed >= anim.duration {
                    self.transform
                } else {
                    let t = elapsed.as_secs_f64() / anim.duration.as_secs_f64();
                    anim.from.lerp(&self.transform, ease_cubic(t))
                }
            }
            _ => self.transform,
        }
    }

    /// The highlighted node's path and color, while the pulse lasts.
    pub fn highlighted(&self, now: Instant) -> Option<(&str, &str)> {
        self.highlight
            .as_ref()
            .filter(|h| now < h.until)
            .map(|h| (h.path.as_str(), h.color.as_str()))
    }

    /// Color for a rendered node, cycling through the configured palette.
    pub fn color_of(&self, node: &RenderedNode) -> Option<&str> {
        if self.options.colors.is_empty() {
            return None;
        }
        let i = node.color % self.options.colors.len();
        Some(self.options.colors[i].as_str())
    }

    /// Fold every node at or below `level` that has children.
    fn apply_expand_level(root: &mut DiagramNode, level: usize) {
        root.walk_mut(&mut |node| {
            if node.depth >= level && !node.children.is_empty() {
                node.payload.fold = true;
            }
        });
    }

    fn relayout(&mut self) {
        let mut layout = Layout {
            options: &self.options,
            arena: Arena::new(),
            order: Vec::new(),
            next_row: 0.0,
            next_color: 0,
        };
        let root = layout.place(&self.data, None, 0.0, 0);
        let Layout { arena, order, .. } = layout;

        self.bounds = order
            .iter()
            .map(|&id| arena[id].get().rect)
            .reduce(|acc, r| acc.union(&r))
            .unwrap_or_default();
        self.arena = arena;
        self.order = order;
        self.root = Some(root);
    }

    fn fit_transform(&self) -> Transform {
        let b = self.bounds;
        if b.width <= 0.0 || b.height <= 0.0 || self.surface.width <= 0.0 {
            return Transform::IDENTITY;
        }
        let ratio = self.options.fit_ratio;
        let k = (self.surface.width * ratio / b.width)
            .min(self.surface.height * ratio / b.height)
            .min(self.options.max_fit_scale);
        let center = b.center();
        Transform::IDENTITY
            .translate(self.surface.width / 2.0, self.surface.height / 2.0)
            .scale(k)
            .translate(-center.x, -center.y)
    }
}

struct Layout<'a> {
    options: &'a DiagramOptions,
    arena: Arena<RenderedNode>,
    order: Vec<NodeId>,
    next_row: f64,
    next_color: usize,
}

impl Layout<'_> {
    fn place(
        &mut self,
        node: &DiagramNode,
        parent: Option<(NodeId, usize)>,
        x: f64,
        parent_color: usize,
    ) -> NodeId {
        let text = node.text();
        let width = text.width() as f64 * self.options.char_width + self.options.padding_x;
        let color = if node.depth <= self.options.color_freeze_level || parent.is_none() {
            let c = self.next_color;
            self.next_color += 1;
            c
        } else {
            parent_color
        };

        let id = self.arena.new_node(RenderedNode {
            path: node.payload.path.clone(),
            text,
            depth: node.depth,
            fold: node.payload.fold,
            has_children: !node.children.is_empty(),
            color,
            rect: Rect::new(x, 0.0, width, self.options.node_height),
        });
        if let Some((parent_id, _)) = parent {
            parent_id.append(id, &mut self.arena);
        }
        self.order.push(id);

        let row = self.options.node_height + self.options.spacing_vertical;
        let y = if node.payload.fold || node.children.is_empty() {
            let y = self.next_row;
            self.next_row += row;
            y
        } else {
            let child_x = x + width + self.options.spacing_horizontal;
            let children: Vec<NodeId> = node
                .children
                .iter()
                .map(|child| self.place(child, Some((id, color)), child_x, color))
                .collect();
            let first = self.arena[children[0]].get().rect.y;
            let last = self.arena[children[children.len() - 1]].get().rect.y;
            (first + last) / 2.0
        };
        self.arena[id].get_mut().rect.y = y;
        id
    }
}

impl DiagramView for MindmapView {
    type Node = NodeId;

    fn create(options: &DiagramOptions, mut root: DiagramNode) -> Result<Self> {
        if options.node_height <= 0.0 || options.char_width <= 0.0 {
            return Err(Error::Render(format!(
                "invalid node metrics: height {}, char width {}",
                options.node_height, options.char_width
            )));
        }
        Self::apply_expand_level(&mut root, options.initial_expand_level);

        let mut view = Self {
            options: options.clone(),
            data: root,
            arena: Arena::new(),
            root: None,
            order: Vec::new(),
            bounds: Rect::default(),
            surface: Size::new(800.0, 600.0),
            transform: Transform::IDENTITY,
            animation: None,
            highlight: None,
            revision: 0,
        };
        view.relayout();
        view.transform = view.fit_transform();
        tracing::debug!(nodes = view.len(), "mindmap created");
        Ok(view)
    }

    fn set_data(&mut self, root: DiagramNode, options: &DiagramOptions) -> Result<()> {
        self.options = options.clone();
        self.data = root;
        self.relayout();
        self.revision += 1;
        Ok(())
    }

    fn data(&self) -> Option<&DiagramNode> {
        Some(&self.data)
    }

    fn find_node(&self, path: &str) -> Option<NodeId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.arena[id].get().path.as_deref() == Some(path))
    }

    fn node_path(&self, node: NodeId) -> Option<&str> {
        self.node(node).and_then(|n| n.path.as_deref())
    }

    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.node(node).map(|n| self.transform.apply_rect(&n.rect))
    }

    fn toggle_node(&mut self, path: &str) -> Option<bool> {
        let node = self.data.find_mut(path)?;
        node.payload.fold = !node.payload.fold;
        let folded = node.payload.fold;
        self.relayout();
        Some(folded)
    }

    fn fit(&mut self) {
        let target = self.fit_transform();
        self.apply_transform(target, self.options.duration());
    }

    fn current_transform(&self) -> Transform {
        self.transform
    }

    fn apply_transform(&mut self, transform: Transform, duration: Duration) {
        let now = Instant::now();
        self.animation = Some(Animation {
            from: self.display_transform(now),
            start: now,
            duration,
        });
        self.transform = transform;
    }

    fn surface(&self) -> Size {
        self.surface
    }

    fn highlight_node(&mut self, node: NodeId, color: &str, duration: Duration) {
        let Some(path) = self.node(node).and_then(|n| n.path.clone()) else {
            return;
        };
        self.highlight = Some(NodeHighlight {
            path,
            color: color.to_string(),
            until: Instant::now() + duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{HeadingTransformer, Transformer, annotate};

    fn tree(markdown: &str) -> DiagramNode {
        let mut root = HeadingTransformer.transform(markdown).unwrap();
        annotate(&mut root);
        root
    }

    fn options(level: usize) -> DiagramOptions {
        DiagramOptions {
            initial_expand_level: level,
            ..Default::default()
        }
    }

    const DOC: &str = "# Root\n## A\n### A1\n#### A1a\n## B\n";

    #[test]
    fn test_initial_expand_level_folds_deep_nodes() {
        let view = MindmapView::create(&options(2), tree(DOC)).unwrap();
        assert!(view.find_node("Root\nA").is_some());
        assert!(view.find_node("Root\nA\nA1").is_some());
        assert!(view.find_node("Root\nA\nA1\nA1a").is_none());
        assert!(view.data().unwrap().find("Root\nA\nA1").unwrap().payload.fold);
    }

    #[test]
    fn test_set_data_honors_payload_folds() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        assert_eq!(view.len(), 5);

        let mut next = tree(DOC);
        next.find_mut("Root\nA").unwrap().payload.fold = true;
        view.set_data(next, &options(6)).unwrap();
        assert_eq!(view.len(), 3);
        assert!(view.find_node("Root\nA\nA1").is_none());
        assert_eq!(view.revision(), 1);
    }

    #[test]
    fn test_toggle_node() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        assert_eq!(view.toggle_node("Root\nA"), Some(true));
        assert!(view.find_node("Root\nA\nA1").is_none());
        assert_eq!(view.toggle_node("Root\nA"), Some(false));
        assert!(view.find_node("Root\nA\nA1").is_some());
        assert_eq!(view.toggle_node("Nope"), None);
    }

    #[test]
    fn test_layout_children_right_of_parent_and_centered() {
        let view = MindmapView::create(&options(6), tree("# R\n## A\n## B\n")).unwrap();
        let rect = |path| view.node(view.find_node(path).unwrap()).unwrap().rect;
        let (r, a, b) = (rect("R"), rect("R\nA"), rect("R\nB"));
        assert!(a.x > r.right());
        assert_eq!(a.x, b.x);
        assert!(b.y > a.y);
        assert_eq!(r.y, (a.y + b.y) / 2.0);
        assert_eq!(r.height, 20.0);
    }

    #[test]
    fn test_branch_colors_freeze_below_level() {
        let view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        let node = |path| view.node(view.find_node(path).unwrap()).unwrap().clone();
        // depth 2 gets its own color, depth 3 inherits it
        assert_eq!(node("Root\nA\nA1").color, node("Root\nA\nA1\nA1a").color);
        assert_ne!(node("Root\nA").color, node("Root\nB").color);
    }

    #[test]
    fn test_fit_centers_bounds() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        view.fit();
        let t = view.current_transform();
        let center = t.apply(view.bounds().center());
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
        assert!(t.k <= 2.0);
    }

    #[test]
    fn test_node_rect_uses_transform() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        view.apply_transform(Transform::new(10.0, 5.0, 2.0), Duration::ZERO);
        let id = view.find_node("Root").unwrap();
        let raw = view.node(id).unwrap().rect;
        let rect = view.node_rect(id).unwrap();
        assert_eq!(rect.x, raw.x * 2.0 + 10.0);
        assert_eq!(rect.height, 40.0);
    }

    #[test]
    fn test_animation_ends_at_target() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        let target = Transform::new(1.0, 2.0, 1.5);
        view.apply_transform(target, Duration::from_millis(500));
        let later = Instant::now() + Duration::from_secs(1);
        assert_eq!(view.display_transform(later), target);
        assert_eq!(view.current_transform(), target);
    }

    #[test]
    fn test_highlight_by_path() {
        let mut view = MindmapView::create(&options(6), tree(DOC)).unwrap();
        let id = view.find_node("Root\nB").unwrap();
        view.highlight_node(id, "#ff0", Duration::from_secs(60));
        assert_eq!(view.highlighted(Instant::now()), Some(("Root\nB", "#ff0")));
    }
}
