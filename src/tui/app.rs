use crate::config::{OptionsPatch, UiConfig};
use crate::diagram::{DiagramView, MindmapView};
use crate::host::{HeadingRef, MarkdownFile};
use crate::nav::Navigation;
use crate::outline::ancestor_paths;
use crate::sync::{OutlineView, Rebuild, ViewStatus};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Document,
    Mindmap,
}

pub struct App {
    pub outline: OutlineView<MarkdownFile, MindmapView>,
    pub filename: String,
    pub focus: Focus,
    /// Path of the selected mindmap node
    pub selected: Option<String>,
    pub status_message: Option<String>,
    pub show_help: bool,
    pub diagram_width: u16, // Percentage of the terminal width
}

impl App {
    pub fn new(
        outline: OutlineView<MarkdownFile, MindmapView>,
        filename: String,
        ui: &UiConfig,
    ) -> Self {
        let mut app = Self {
            outline,
            filename,
            focus: Focus::Document,
            selected: None,
            status_message: None,
            show_help: false,
            diagram_width: ui.diagram_width.clamp(20, 80),
        };
        if ui.show_diagram {
            app.outline.show();
            app.ensure_selection();
        }
        app
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Document if self.outline.is_visible() => Focus::Mindmap,
            _ => Focus::Document,
        };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_diagram(&mut self) {
        self.outline.toggle();
        if self.outline.is_visible() {
            self.ensure_selection();
            self.status_message = Some("Mindmap shown".to_string());
        } else {
            self.focus = Focus::Document;
            self.selected = None;
            self.status_message = Some("Mindmap hidden".to_string());
        }
    }

    pub fn scroll_document(&mut self, delta: isize) {
        self.outline.host_mut().scroll_by(delta);
        if let Some(nav) = self.outline.on_viewport_scrolled() {
            self.select_current_heading();
            self.report(nav);
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let Some(view) = self.outline.view() else {
            return;
        };
        let paths: Vec<&str> = view.nodes().filter_map(|(_, n)| n.path.as_deref()).collect();
        if paths.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_deref()
            .and_then(|s| paths.iter().position(|p| *p == s))
            .unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(paths.len() - 1);
        self.selected = Some(paths[next].to_string());
    }

    /// Enter: jump from the focused pane to the other side.
    pub fn activate(&mut self) {
        match self.focus {
            Focus::Document => self.focus_heading_at_cursor(),
            Focus::Mindmap => self.jump_to_selected_heading(),
        }
    }

    /// Focus the mindmap node of the heading at or above the top line.
    pub fn focus_heading_at_cursor(&mut self) {
        let host = self.outline.host();
        let Some(heading) = host.heading_at_or_above(host.scroll()) else {
            self.status_message = Some("No heading above the cursor".to_string());
            return;
        };
        let nav = self.outline.on_heading_clicked(&heading);
        self.select_heading(&heading);
        self.report(nav);
    }

    /// Scroll the document to the selected node's heading.
    pub fn jump_to_selected_heading(&mut self) {
        let Some(path) = self.selected.clone() else {
            return;
        };
        let Some(node) = self.outline.view().and_then(|v| v.find_node(&path)) else {
            return;
        };
        if self.outline.navigate_to_diagram_node(node) {
            self.status_message = Some(format!("→ {}", leaf(&path)));
        } else {
            self.status_message = Some(format!("✗ No heading for {}", leaf(&path)));
        }
    }

    pub fn toggle_selected_fold(&mut self) {
        let Some(path) = self.selected.clone() else {
            return;
        };
        if let Some(view) = self.outline.view_mut() {
            match view.toggle_node(&path) {
                Some(true) => self.status_message = Some(format!("▶ Folded {}", leaf(&path))),
                Some(false) => self.status_message = Some(format!("▼ Expanded {}", leaf(&path))),
                None => {}
            }
        }
    }

    pub fn fit_to_current_heading(&mut self) {
        let nav = self.outline.fit_to_current_heading();
        self.select_current_heading();
        self.report(nav);
    }

    pub fn fit(&mut self) {
        self.outline.fit();
    }

    pub fn zoom_in(&mut self) {
        self.outline.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.outline.zoom_out();
    }

    pub fn change_expand_level(&mut self, delta: isize) {
        let level = self
            .outline
            .config()
            .diagram
            .initial_expand_level
            .saturating_add_signed(delta);
        self.outline.update_options(&OptionsPatch {
            initial_expand_level: Some(level),
            ..Default::default()
        });
        self.ensure_selection();
        self.status_message = Some(format!(
            "Expand level: {}",
            self.outline.config().diagram.initial_expand_level
        ));
    }

    pub fn toggle_live(&mut self) {
        let realtime = !self.outline.config().sync.realtime;
        self.outline.update_options(&OptionsPatch {
            realtime: Some(realtime),
            ..Default::default()
        });
        self.status_message = Some(if realtime {
            "Live updates on".to_string()
        } else {
            "Live updates off (r to rebuild)".to_string()
        });
    }

    pub fn toggle_follow(&mut self) {
        let follow = !self.outline.config().navigation.follow_scroll;
        self.outline.update_options(&OptionsPatch {
            follow_scroll: Some(follow),
            ..Default::default()
        });
        self.status_message = Some(format!(
            "Follow scroll {}",
            if follow { "on" } else { "off" }
        ));
    }

    pub fn refresh(&mut self) {
        let outcome = self.outline.refresh();
        self.after_rebuild(outcome);
    }

    pub fn save_config(&mut self) {
        let mut config = self.outline.config().clone();
        config.ui.diagram_width = self.diagram_width;
        config.ui.show_diagram = self.outline.is_visible();
        self.status_message = Some(match config.save() {
            Ok(()) => "✓ Options saved".to_string(),
            Err(e) => format!("✗ Failed to save options: {}", e),
        });
    }

    pub fn resize_diagram(&mut self, delta: i16) {
        self.diagram_width = (self.diagram_width as i16 + delta).clamp(20, 80) as u16;
    }

    /// Advance timers and pick up file changes.
    pub fn tick(&mut self, now: Instant) {
        if let Err(e) = self.outline.host_mut().reload_if_dirty() {
            self.status_message = Some(format!("✗ Reload failed: {}", e));
        }
        if let Some(outcome) = self.outline.tick(now) {
            self.after_rebuild(outcome);
        }
        self.ensure_selection();
    }

    fn after_rebuild(&mut self, outcome: Rebuild) {
        self.ensure_selection();
        match outcome {
            Rebuild::Rebuilt => self.status_message = Some("↻ Mindmap rebuilt".to_string()),
            Rebuild::Failed => {
                if let ViewStatus::Error(msg) = self.outline.status() {
                    self.status_message = Some(format!("✗ Rebuild failed: {}", msg));
                }
            }
            Rebuild::Unchanged | Rebuild::Empty | Rebuild::Skipped => {}
        }
    }

    /// Keep the selection on a rendered node: the selected node, its nearest
    /// rendered ancestor, or the first node.
    fn ensure_selection(&mut self) {
        let Some(view) = self.outline.view() else {
            self.selected = None;
            return;
        };
        let kept = self.selected.as_deref().and_then(|path| {
            std::iter::once(path)
                .chain(ancestor_paths(path).into_iter().rev())
                .find(|p| view.find_node(p).is_some())
                .map(str::to_owned)
        });
        self.selected = kept.or_else(|| view.nodes().find_map(|(_, n)| n.path.clone()));
    }

    fn select_heading(&mut self, heading: &HeadingRef) {
        if let Some(path) = self.outline.index().lookup_path(heading) {
            self.selected = Some(path.to_string());
        }
    }

    fn select_current_heading(&mut self) {
        if let Some(path) = self.outline.current_visible_heading().map(|h| h.path.clone()) {
            self.selected = Some(path);
        }
    }

    fn report(&mut self, nav: Navigation) {
        self.status_message = match nav {
            Navigation::Focused | Navigation::Pending => None,
            Navigation::FitFallback => Some("No matching node, showing whole mindmap".to_string()),
            Navigation::Unavailable => Some("Mindmap hidden (m to show)".to_string()),
        };
    }
}

/// Last segment of a path.
fn leaf(path: &str) -> &str {
    path.rsplit('\n').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagram::HeadingTransformer;
    use crate::host::HostDocument;

    const DOC: &str =
        "# Guide\nintro\n## Install\nsteps\n### Linux\n#### Debian\n##### Bookworm\napt\n## Usage\nrun\n";

    fn app(content: &str) -> App {
        let config = Config::default();
        let host = MarkdownFile::from_content(content, &config.document);
        let outline = OutlineView::new(host, Box::new(HeadingTransformer), config);
        App::new(outline, "doc.md".to_string(), &UiConfig::default())
    }

    #[test]
    fn test_new_shows_and_selects_root() {
        let app = app(DOC);
        assert!(app.outline.is_visible());
        assert_eq!(app.selected.as_deref(), Some("Guide"));
    }

    #[test]
    fn test_hidden_at_start() {
        let config = Config::default();
        let host = MarkdownFile::from_content(DOC, &config.document);
        let outline = OutlineView::new(host, Box::new(HeadingTransformer), config);
        let ui = UiConfig {
            show_diagram: false,
            ..Default::default()
        };
        let mut app = App::new(outline, "doc.md".to_string(), &ui);
        assert!(!app.outline.is_visible());
        assert!(app.selected.is_none());

        app.toggle_focus();
        assert_eq!(app.focus, Focus::Document);
    }

    #[test]
    fn test_move_selection_in_preorder() {
        let mut app = app(DOC);
        app.move_selection(1);
        assert_eq!(app.selected.as_deref(), Some("Guide\nInstall"));
        app.move_selection(1);
        assert_eq!(app.selected.as_deref(), Some("Guide\nInstall\nLinux"));
        app.move_selection(10);
        assert_eq!(app.selected.as_deref(), Some("Guide\nUsage"));
        app.move_selection(-10);
        assert_eq!(app.selected.as_deref(), Some("Guide"));
    }

    #[test]
    fn test_toggle_selected_fold() {
        let mut app = app(DOC);
        app.selected = Some("Guide\nInstall".to_string());
        app.toggle_selected_fold();
        assert_eq!(app.status_message.as_deref(), Some("▶ Folded Install"));
        assert!(app.outline.view().unwrap().find_node("Guide\nInstall\nLinux").is_none());
        app.toggle_selected_fold();
        assert_eq!(app.status_message.as_deref(), Some("▼ Expanded Install"));
    }

    #[test]
    fn test_hidden_selection_moves_to_ancestor() {
        let mut app = app(DOC);
        app.selected = Some("Guide\nInstall\nLinux".to_string());
        app.outline.view_mut().unwrap().toggle_node("Guide\nInstall");
        app.ensure_selection();
        assert_eq!(app.selected.as_deref(), Some("Guide\nInstall"));
    }

    #[test]
    fn test_enter_in_mindmap_scrolls_document() {
        let mut app = app(DOC);
        app.focus = Focus::Mindmap;
        app.selected = Some("Guide\nUsage".to_string());
        app.activate();
        // Usage is on line 8; 48 units of offset leave two lines above it
        assert_eq!(app.outline.host().scroll(), 6);
        assert_eq!(
            app.outline.host().heading_highlight(Instant::now()).map(|(line, _)| line),
            Some(8)
        );
    }

    #[test]
    fn test_enter_in_document_selects_heading() {
        let mut app = app(DOC);
        app.outline.host_mut().set_scroll(3);
        app.activate();
        assert_eq!(app.selected.as_deref(), Some("Guide\nInstall"));
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_expand_level_change_recreates_view() {
        let mut app = app(DOC);
        let bookworm = "Guide\nInstall\nLinux\nDebian\nBookworm";
        assert!(app.outline.view().unwrap().find_node(bookworm).is_none());
        app.change_expand_level(1);
        assert_eq!(app.outline.config().diagram.initial_expand_level, 4);
        assert!(app.outline.view().unwrap().find_node(bookworm).is_some());

        app.change_expand_level(10);
        assert_eq!(app.outline.config().diagram.initial_expand_level, 4);
    }

    #[test]
    fn test_toggle_diagram_resets_focus() {
        let mut app = app(DOC);
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Mindmap);
        app.toggle_diagram();
        assert!(!app.outline.is_visible());
        assert_eq!(app.focus, Focus::Document);
        assert!(app.selected.is_none());
        app.toggle_diagram();
        assert_eq!(app.selected.as_deref(), Some("Guide"));
    }

    #[test]
    fn test_live_toggle() {
        let mut app = app(DOC);
        assert!(app.outline.trigger_source().is_some());
        app.toggle_live();
        assert!(!app.outline.config().sync.realtime);
        assert!(app.outline.trigger_source().is_none());
    }

    #[test]
    fn test_edit_rebuilds_on_tick() {
        let mut app = app(DOC);
        app.outline
            .host_mut()
            .set_content(format!("{}## FAQ\n", DOC));
        let now = Instant::now();
        app.tick(now);
        assert!(app.status_message.is_none());

        app.tick(now + app.outline.config().sync.debounce());
        assert_eq!(app.status_message.as_deref(), Some("↻ Mindmap rebuilt"));
        assert!(app.outline.index().lookup_element("Guide\nFAQ").is_some());
        assert_eq!(app.outline.host().headings().len(), 7);
    }

    #[test]
    fn test_leaf() {
        assert_eq!(leaf("A\nB\nC"), "C");
        assert_eq!(leaf("A"), "A");
    }
}
