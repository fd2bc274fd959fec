//! Navigation between the document and the diagram.
//!
//! Document → diagram: pick the current heading from the viewport, find its
//! node (expanding folded ancestors if needed) and pan/zoom onto it.
//! Diagram → document: scroll the heading of a clicked node into view.

use crate::diagram::{DiagramView, Rect, Size, Transform};
use crate::host::{HostDocument, Viewport};
use crate::outline::{HeadingInfo, ancestor_paths};
use crate::sync::{OutlineView, Task};
use std::time::Duration;

/// Duration of a zoom step.
pub const ZOOM_DURATION: Duration = Duration::from_millis(250);

/// Outcome of a request to focus a heading's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The node was found and focused
    Focused,
    /// Folded ancestors were expanded; the node is re-queried after the settle delay
    Pending,
    /// No matching node; the whole diagram was fitted instead
    FitFallback,
    /// No diagram to navigate
    Unavailable,
}

/// The heading the reader is looking at.
///
/// The first heading whose offset lies in `[top - margin, bottom]`, else the
/// one closest to the viewport top. Headings without an offset are ignored.
pub fn current_visible_heading<'a, E>(
    headings: &'a [HeadingInfo<E>],
    offset: impl Fn(&E) -> Option<f64>,
    viewport: Viewport,
    margin: f64,
) -> Option<&'a HeadingInfo<E>> {
    let measured: Vec<(&HeadingInfo<E>, f64)> = headings
        .iter()
        .filter_map(|h| offset(&h.element).map(|o| (h, o)))
        .collect();

    let window = (viewport.top - margin)..=viewport.bottom();
    if let Some(&(heading, _)) = measured.iter().find(|(_, o)| window.contains(o)) {
        return Some(heading);
    }

    measured
        .into_iter()
        .min_by(|(_, a), (_, b)| {
            (a - viewport.top)
                .abs()
                .total_cmp(&(b - viewport.top).abs())
        })
        .map(|(h, _)| h)
}

/// Zoom at which a node's text matches the document's base font size.
///
/// `node_height` is the node's rendered height at `zoom`. Returns `default`
/// when anything cannot be measured.
pub fn calculate_optimal_scale(
    node_height: Option<f64>,
    zoom: f64,
    base_font_size: Option<f64>,
    default: f64,
) -> f64 {
    let (Some(height), Some(font)) = (node_height, base_font_size) else {
        tracing::debug!("node or font size unavailable, using default scale");
        return default;
    };
    if !(height.is_finite() && height > 0.0 && zoom.is_finite() && zoom > 0.0 && font > 0.0) {
        tracing::debug!(height, zoom, font, "unusable measurement, using default scale");
        return default;
    }

    let scale = font / (height / zoom);
    if scale.is_finite() { scale } else { default }
}

/// Transform centering `node` (a surface rect under `current`) at `scale`.
pub fn focus_transform(node: Rect, current: Transform, surface: Size, scale: f64) -> Transform {
    let ox = (node.x - current.x) / current.k + node.width / (2.0 * current.k);
    let oy = (node.y - current.y) / current.k + node.height / (2.0 * current.k);
    Transform::IDENTITY
        .translate(surface.width / 2.0, surface.height / 2.0)
        .scale(scale)
        .translate(-ox, -oy)
}

impl<H: HostDocument, V: DiagramView> OutlineView<H, V> {
    pub fn current_visible_heading(&self) -> Option<&HeadingInfo<H::Element>> {
        current_visible_heading(
            &self.headings,
            |e| self.host.heading_offset(e),
            self.host.viewport(),
            self.config.navigation.viewport_margin,
        )
    }

    /// Focus the diagram node of the heading at `path`.
    pub fn navigate_to_heading(&mut self, path: &str) -> Navigation {
        let Some(view) = self.view.as_mut() else {
            return Navigation::Unavailable;
        };

        if let Some(node) = view.find_node(path) {
            self.focus_node(node);
            return Navigation::Focused;
        }

        let folded: Vec<String> = ancestor_paths(path)
            .into_iter()
            .filter(|ancestor| {
                view.data()
                    .and_then(|root| root.find(ancestor))
                    .is_some_and(|node| node.payload.fold)
            })
            .map(str::to_owned)
            .collect();

        if folded.is_empty() {
            self.fit_fallback(path);
            return Navigation::FitFallback;
        }

        for ancestor in &folded {
            view.toggle_node(ancestor);
        }
        tracing::debug!(path, expanded = folded.len(), "expanded folded ancestors");
        self.timers.schedule(
            self.now() + self.config.navigation.settle(),
            Task::RetryNavigate {
                path: path.to_string(),
            },
        );
        Navigation::Pending
    }

    fn fit_fallback(&mut self, path: &str) {
        tracing::warn!(
            path,
            known = ?self.index.paths(),
            "no diagram node for heading, fitting whole diagram"
        );
        self.fit();
    }

    fn focus_node(&mut self, node: V::Node) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let scale = calculate_optimal_scale(
            view.node_rect(node).map(|r| r.height),
            view.current_transform().k,
            self.host.base_font_size(),
            self.config.navigation.default_scale,
        );
        self.pan_and_zoom_to_node(node, scale);
    }

    /// Center `node` at `scale`, animated, and pulse its highlight.
    pub fn pan_and_zoom_to_node(&mut self, node: V::Node, scale: f64) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let Some(rect) = view.node_rect(node) else {
            tracing::debug!(?node, "node has no geometry");
            return;
        };

        let target = focus_transform(rect, view.current_transform(), view.surface(), scale);
        view.apply_transform(target, self.config.navigation.animation());
        view.highlight_node(
            node,
            &self.config.highlight.node_color,
            self.config.highlight.duration(),
        );
        tracing::debug!(?node, scale, "focused diagram node");
    }

    /// Scroll the heading of a diagram node into view and highlight it.
    ///
    /// Returns false if the node has no matching heading.
    pub fn navigate_to_diagram_node(&mut self, node: V::Node) -> bool {
        let Some(path) = self
            .view
            .as_ref()
            .and_then(|view| view.node_path(node))
            .map(str::to_owned)
        else {
            return false;
        };
        let Some(element) = self.index.lookup_element(&path).cloned() else {
            tracing::warn!(path = %path, known = ?self.index.paths(), "no heading for diagram node");
            return false;
        };

        let nav = &self.config.navigation;
        let clear_at = self.now() + nav.scroll_settle();
        self.host.scroll_into_view(&element, nav.scroll_offset);
        self.host.highlight_heading(
            &element,
            &self.config.highlight.heading_color,
            self.config.highlight.duration(),
        );
        self.timers
            .schedule(clear_at, Task::ClearHeadingStyling { element });
        self.followed = Some(path);
        true
    }

    /// Focus the node of the heading currently in view, or fit the diagram.
    pub fn fit_to_current_heading(&mut self) -> Navigation {
        if self.view.is_none() {
            return Navigation::Unavailable;
        }
        match self.current_visible_heading().map(|h| h.path.clone()) {
            Some(path) => self.navigate_to_heading(&path),
            None => {
                tracing::debug!("no current heading, fitting whole diagram");
                self.fit();
                Navigation::FitFallback
            }
        }
    }

    pub fn on_heading_clicked(&mut self, element: &H::Element) -> Navigation {
        match self.index.lookup_path(element).map(str::to_owned) {
            Some(path) => self.navigate_to_heading(&path),
            None => {
                tracing::warn!(?element, known = ?self.index.paths(), "heading not in diagram");
                self.fit();
                Navigation::FitFallback
            }
        }
    }

    /// Follow the reader: focus the current heading when it changes.
    pub fn on_viewport_scrolled(&mut self) -> Option<Navigation> {
        if !self.config.navigation.follow_scroll || self.view.is_none() {
            return None;
        }
        let path = self.current_visible_heading()?.path.clone();
        if self.followed.as_deref() == Some(path.as_str()) {
            return None;
        }
        self.followed = Some(path.clone());
        Some(self.navigate_to_heading(&path))
    }

    pub fn zoom_in(&mut self) {
        let step = 1.0 + self.config.diagram.zoom_step;
        self.zoom_by(step);
    }

    pub fn zoom_out(&mut self) {
        let step = 1.0 + self.config.diagram.zoom_step;
        self.zoom_by(1.0 / step);
    }

    fn zoom_by(&mut self, factor: f64) {
        if let Some(view) = self.view.as_mut() {
            let center = view.surface().center();
            let target = view.current_transform().scale_about(center, factor);
            view.apply_transform(target, ZOOM_DURATION);
        }
    }

    pub fn fit(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.fit();
        }
    }

    pub(crate) fn run_task(&mut self, task: Task<H::Element>) {
        match task {
            Task::RetryNavigate { path } => {
                let Some(view) = self.view.as_ref() else {
                    return;
                };
                match view.find_node(&path) {
                    Some(node) => self.focus_node(node),
                    None => self.fit_fallback(&path),
                }
            }
            Task::ClearHeadingStyling { element } => self.host.clear_heading_styling(&element),
            Task::Fit => self.fit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionsPatch;
    use crate::outline::{extract_headings, tests::StaticHost};
    use crate::sync::tests::file_view;
    use std::time::Instant;

    fn viewport(top: f64) -> Viewport {
        Viewport { top, height: 400.0 }
    }

    #[test]
    fn test_heading_just_above_viewport_is_current() {
        let headings = extract_headings(&StaticHost::new(&[(1, "Intro"), (1, "Methods")]));
        let offsets = [0.0, 950.0];
        let current =
            current_visible_heading(&headings, |e| Some(offsets[*e]), viewport(1000.0), 100.0);
        assert_eq!(current.map(|h| h.text.as_str()), Some("Methods"));
    }

    #[test]
    fn test_first_heading_in_window_wins() {
        let headings = extract_headings(&StaticHost::new(&[(1, "A"), (1, "B"), (1, "C")]));
        let offsets = [100.0, 1100.0, 1300.0];
        let current =
            current_visible_heading(&headings, |e| Some(offsets[*e]), viewport(1000.0), 100.0);
        assert_eq!(current.map(|h| h.text.as_str()), Some("B"));
    }

    #[test]
    fn test_nearest_heading_when_none_visible() {
        let headings = extract_headings(&StaticHost::new(&[(1, "A"), (1, "B"), (1, "C")]));
        let offsets = [0.0, 700.0, 3000.0];
        let current =
            current_visible_heading(&headings, |e| Some(offsets[*e]), viewport(1000.0), 100.0);
        assert_eq!(current.map(|h| h.text.as_str()), Some("B"));

        let none: Option<&HeadingInfo<usize>> =
            current_visible_heading(&headings, |_| None, viewport(0.0), 100.0);
        assert!(none.is_none());
    }

    #[test]
    fn test_optimal_scale() {
        assert_eq!(calculate_optimal_scale(Some(40.0), 2.0, Some(16.0), 2.0), 0.8);
        assert_eq!(calculate_optimal_scale(Some(0.0), 1.0, Some(16.0), 2.0), 2.0);
        assert_eq!(calculate_optimal_scale(None, 1.0, Some(16.0), 2.0), 2.0);
        assert_eq!(calculate_optimal_scale(Some(20.0), 1.0, None, 2.0), 2.0);
        assert_eq!(calculate_optimal_scale(Some(20.0), 0.0, Some(16.0), 2.0), 2.0);
    }

    #[test]
    fn test_focus_transform_centers_node() {
        let current = Transform::new(30.0, -10.0, 1.5);
        let node = Rect::new(120.0, 60.0, 90.0, 30.0);
        let surface = Size::new(800.0, 600.0);
        let t = focus_transform(node, current, surface, 2.0);

        let diagram_center = current.invert(node.center());
        let on_surface = t.apply(diagram_center);
        assert!((on_surface.x - 400.0).abs() < 1e-9);
        assert!((on_surface.y - 300.0).abs() < 1e-9);
        assert_eq!(t.k, 2.0);
    }

    const DOC: &str = "# Guide\n## Setup\n### Install\n#### Linux\n##### Debian\n## Usage\n";

    #[test]
    fn test_navigate_to_visible_node() {
        let mut view = file_view(DOC);
        assert_eq!(view.navigate_to_heading("Guide\nUsage"), Navigation::Focused);

        let mindmap = view.view().unwrap();
        let node = mindmap.find_node("Guide\nUsage").unwrap();
        let rect = mindmap.node_rect(node).unwrap();
        // Node text is 20 high at zoom 1, the document font is 16
        assert!((mindmap.current_transform().k - 0.8).abs() < 1e-9);
        assert!((rect.center().x - 400.0).abs() < 1e-9);
        assert!((rect.center().y - 300.0).abs() < 1e-9);
        assert_eq!(
            mindmap.highlighted(Instant::now()).map(|(p, _)| p),
            Some("Guide\nUsage")
        );
    }

    #[test]
    fn test_navigate_expands_folded_ancestors() {
        let mut view = file_view(DOC);
        // Expand level 3 folds "Linux", hiding "Debian"
        let target = "Guide\nSetup\nInstall\nLinux\nDebian";
        assert!(view.view().unwrap().find_node(target).is_none());

        assert_eq!(view.navigate_to_heading(target), Navigation::Pending);
        assert!(view.view().unwrap().find_node(target).is_some());

        view.tick(Instant::now() + Duration::from_secs(1));
        let mindmap = view.view().unwrap();
        assert_eq!(
            mindmap.highlighted(Instant::now()).map(|(p, _)| p),
            Some(target)
        );
    }

    #[test]
    fn test_unknown_path_falls_back_to_fit() {
        let mut view = file_view(DOC);
        assert_eq!(view.navigate_to_heading("Nowhere"), Navigation::FitFallback);
    }

    #[test]
    fn test_navigate_to_diagram_node_scrolls_document() {
        let content = format!("{DOC}{}", "text\n".repeat(100));
        let mut view = file_view(&content);
        let node = view.view().unwrap().find_node("Guide\nUsage").unwrap();

        assert!(view.navigate_to_diagram_node(node));
        // "Usage" is on line 5; the 48 unit offset leaves two lines above it
        assert_eq!(view.host().scroll(), 3);
        assert_eq!(view.host().heading_highlight(Instant::now()).map(|h| h.0), Some(5));

        view.tick(Instant::now() + Duration::from_secs(5));
        assert_eq!(view.host().heading_highlight(Instant::now()), None);
    }

    #[test]
    fn test_heading_click_and_follow_scroll() {
        let content = format!("{DOC}{}## Later\n{}", "text\n".repeat(60), "text\n".repeat(60));
        let mut view = file_view(&content);

        let usage = view.index().lookup_element("Guide\nUsage").copied().unwrap();
        assert_eq!(view.on_heading_clicked(&usage), Navigation::Focused);

        assert_eq!(view.on_viewport_scrolled(), None);
        view.update_options(&OptionsPatch {
            follow_scroll: Some(true),
            ..Default::default()
        });
        view.host_mut().set_scroll(64);
        assert_eq!(view.on_viewport_scrolled(), Some(Navigation::Focused));
        assert_eq!(view.on_viewport_scrolled(), None);
    }

    #[test]
    fn test_zoom_steps() {
        let mut view = file_view(DOC);
        let before = view.view().unwrap().current_transform().k;
        view.zoom_in();
        let zoomed = view.view().unwrap().current_transform().k;
        assert!((zoomed - before * 1.2).abs() < 1e-9);
        view.zoom_out();
        let back = view.view().unwrap().current_transform().k;
        assert!((back - before).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_current_heading() {
        let mut view = file_view(DOC);
        assert_eq!(view.fit_to_current_heading(), Navigation::Focused);
        view.hide();
        assert_eq!(view.fit_to_current_heading(), Navigation::Unavailable);
    }
}
