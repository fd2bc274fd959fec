use crate::diagram::{DiagramView, MindmapView, Size, Transform};
use crate::host::HostDocument;
use crate::sync::ViewStatus;
use crate::tui::app::{App, Focus};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use std::time::Instant;

const BORDER_FOCUSED: Color = Color::Rgb(100, 200, 255);
const BORDER: Color = Color::Rgb(80, 80, 100);
const EDGE: Color = Color::Rgb(90, 90, 110);

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let [title_area, body, status_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_title_bar(frame, app, title_area);

    if app.outline.is_visible() {
        let [doc_area, map_area] = Layout::horizontal([
            Constraint::Percentage(100 - app.diagram_width),
            Constraint::Percentage(app.diagram_width),
        ])
        .areas(body);
        render_document(frame, app, doc_area);
        render_mindmap(frame, app, map_area);
    } else {
        render_document(frame, app, body);
    }

    render_status_bar(frame, app, status_area);

    if app.show_help {
        render_help_popup(frame, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title_text = format!(
        "tocmap - {} - {} headings",
        app.filename,
        app.outline.host().headings().len()
    );

    let title = Paragraph::new(title_text)
        .style(
            Style::default()
                .fg(Color::Rgb(100, 200, 255))
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, area);
}

fn pane_block(title: &'static str, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { BORDER_FOCUSED } else { BORDER }))
        .title(title)
}

fn heading_color(level: usize) -> Color {
    match level {
        1 => Color::Rgb(100, 200, 255),
        2 => Color::Rgb(150, 220, 150),
        3 => Color::Rgb(255, 200, 100),
        4 => Color::Rgb(220, 150, 220),
        _ => Color::Rgb(180, 180, 180),
    }
}

fn parse_color(hex: &str) -> Option<Color> {
    hex.parse().ok()
}

fn render_document(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = pane_block(" Document ", app.focus == Focus::Document);
    let inner = block.inner(area);
    app.outline
        .host_mut()
        .set_viewport_lines(inner.height as usize);

    let host = app.outline.host();
    let scroll = host.scroll();
    let highlight = host.heading_highlight(Instant::now());

    let lines: Vec<Line> = host
        .content()
        .lines()
        .enumerate()
        .skip(scroll)
        .take(inner.height as usize)
        .map(|(i, text)| {
            let mut style = match host.heading_level_at(i) {
                Some(level) => Style::default()
                    .fg(heading_color(level))
                    .add_modifier(Modifier::BOLD),
                None => Style::default(),
            };
            if let Some(bg) = highlight
                .filter(|(line, _)| *line == i)
                .and_then(|(_, color)| parse_color(color))
            {
                style = style.bg(bg).fg(Color::Black);
            }
            Line::from(Span::styled(text.to_string(), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);

    let mut scrollbar_state = ScrollbarState::new(host.line_count()).position(scroll);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"))
        .style(Style::default().fg(BORDER));
    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_mindmap(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = pane_block(" Mindmap ", app.focus == Focus::Mindmap);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // One cell is char_width x node_height diagram units at scale 1
    if let Some(view) = app.outline.view_mut() {
        let opts = view.options();
        let surface = Size::new(
            inner.width as f64 * opts.char_width,
            inner.height as f64 * opts.node_height,
        );
        if view.surface() != surface {
            view.set_surface(surface);
        }
    }

    let message = match app.outline.status() {
        ViewStatus::Empty => Some(("No headings in this document", Color::Gray)),
        ViewStatus::Error(_) if app.outline.view().is_none() => {
            Some(("Mindmap unavailable, see status bar", Color::Red))
        }
        _ => None,
    };
    if let Some((text, color)) = message {
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(color).add_modifier(Modifier::ITALIC))
            .centered();
        let [middle] = Layout::vertical([Constraint::Length(1)])
            .flex(Flex::Center)
            .areas(inner);
        frame.render_widget(paragraph, middle);
        return;
    }

    let Some(view) = app.outline.view() else {
        return;
    };
    let selected = (app.focus == Focus::Mindmap)
        .then_some(app.selected.as_deref())
        .flatten();
    draw_mindmap(frame.buffer_mut(), inner, view, selected, Instant::now());
}

/// Cell coordinates of a node: label start column, right edge column, row.
#[derive(Debug, Clone, Copy)]
struct Placement {
    left: i32,
    right: i32,
    row: i32,
}

fn place(view: &MindmapView, t: &Transform, rect: &crate::diagram::Rect, area: Rect) -> Placement {
    let opts = view.options();
    let r = t.apply_rect(rect);
    Placement {
        left: area.x as i32 + (r.x / opts.char_width).round() as i32,
        right: area.x as i32 + (r.right() / opts.char_width).round() as i32,
        row: area.y as i32 + (r.center().y / opts.node_height).floor() as i32,
    }
}

fn draw_mindmap(
    buf: &mut Buffer,
    area: Rect,
    view: &MindmapView,
    selected: Option<&str>,
    now: Instant,
) {
    let t = view.display_transform(now);
    let highlighted = view.highlighted(now);
    let edge_style = Style::default().fg(EDGE);

    for (id, node) in view.nodes() {
        let Some(parent) = view.parent(id).and_then(|p| view.node(p)) else {
            continue;
        };
        let from = place(view, &t, &parent.rect, area);
        let to = place(view, &t, &node.rect, area);
        draw_edge(buf, area, from, to, edge_style);
    }

    for (_, node) in view.nodes() {
        let at = place(view, &t, &node.rect, area);
        let indicator = match (node.has_children, node.fold) {
            (true, true) => "▶ ",
            (true, false) => "▼ ",
            (false, _) => "",
        };
        let label = format!("{}{}", indicator, node.text);

        let mut style = Style::default().fg(view
            .color_of(node)
            .and_then(parse_color)
            .unwrap_or(Color::White));
        if node.depth == 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if let Some((_, color)) = highlighted.filter(|(path, _)| node.path.as_deref() == Some(*path))
        {
            if let Some(bg) = parse_color(color) {
                style = style.bg(bg).fg(Color::Black);
            }
        }
        if selected.is_some() && node.path.as_deref() == selected {
            style = style.add_modifier(Modifier::REVERSED);
        }

        put_str(buf, area, at.left, at.row, &label, style);
    }
}

/// Elbow connector: out of the parent, down or up at the midpoint, into the child.
fn draw_edge(buf: &mut Buffer, area: Rect, from: Placement, to: Placement, style: Style) {
    let mid = (from.right + to.left) / 2;
    for x in from.right..mid {
        put_char(buf, area, x, from.row, '─', style);
    }
    let (top, bottom) = (from.row.min(to.row), from.row.max(to.row));
    for y in top..=bottom {
        put_char(buf, area, mid, y, '│', style);
    }
    let corner = match to.row.cmp(&from.row) {
        std::cmp::Ordering::Greater => '╰',
        std::cmp::Ordering::Less => '╭',
        std::cmp::Ordering::Equal => '─',
    };
    put_char(buf, area, mid, to.row, corner, style);
    for x in mid + 1..to.left.saturating_sub(1) {
        put_char(buf, area, x, to.row, '─', style);
    }
}

fn put_char(buf: &mut Buffer, area: Rect, x: i32, y: i32, ch: char, style: Style) {
    if !contains(area, x, y) {
        return;
    }
    if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
        cell.set_char(ch).set_style(style);
    }
}

/// Write `text` from column `x`, clipped to `area`.
fn put_str(buf: &mut Buffer, area: Rect, x: i32, y: i32, text: &str, style: Style) {
    if y < area.y as i32 || y >= area.bottom() as i32 {
        return;
    }
    let right = area.right() as i32;
    let mut col = x;
    for ch in text.chars() {
        let width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0) as i32;
        if col + width > right {
            break;
        }
        if contains(area, col, y) {
            if let Some(cell) = buf.cell_mut((col as u16, y as u16)) {
                cell.set_char(ch).set_style(style);
            }
        }
        col += width.max(1);
    }
}

fn contains(area: Rect, x: i32, y: i32) -> bool {
    x >= area.x as i32 && x < area.right() as i32 && y >= area.y as i32 && y < area.bottom() as i32
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focus_indicator = match app.focus {
        Focus::Document => "Document",
        Focus::Mindmap => "Mindmap",
    };
    let config = app.outline.config();

    let text = match &app.status_message {
        Some(message) => format!(" {} ", message),
        None => {
            let zoom = app
                .outline
                .view()
                .map(|v| format!("{:.0}%", v.current_transform().k * 100.0))
                .unwrap_or_else(|| "-".to_string());
            let error = match app.outline.status() {
                ViewStatus::Error(msg) => format!(" • ✗ {}", msg),
                _ => String::new(),
            };
            format!(
                " [{}] Line {}/{} • Level:{} • Zoom:{} • Live:{} • Follow:{}{} • ?:Help ",
                focus_indicator,
                app.outline.host().scroll() + 1,
                app.outline.host().line_count(),
                config.diagram.initial_expand_level,
                zoom,
                if config.sync.realtime { "on" } else { "off" },
                if config.navigation.follow_scroll { "on" } else { "off" },
                error,
            )
        }
    };

    let status = Paragraph::new(text).style(
        Style::default()
            .bg(Color::Rgb(40, 40, 60))
            .fg(Color::Rgb(200, 200, 220)),
    );
    frame.render_widget(status, area);
}

const HELP: &[(&str, &str)] = &[
    ("j/k ↓/↑", "Scroll document / move node selection"),
    ("d/u", "Scroll half a page"),
    ("Tab", "Switch between document and mindmap"),
    ("Enter", "Focus heading's node / scroll to node's heading"),
    ("Space", "Fold or expand selected node"),
    ("f", "Focus the heading in view"),
    ("F", "Fit whole mindmap"),
    ("+/-", "Zoom in / out"),
    ("[/]", "Decrease / increase expand level"),
    ("</>", "Shrink / grow mindmap pane"),
    ("l", "Toggle live updates"),
    ("s", "Toggle follow scroll"),
    ("S", "Save options"),
    ("r", "Rebuild mindmap"),
    ("m", "Show / hide mindmap"),
    ("q", "Quit"),
];

fn render_help_popup(frame: &mut Frame, area: Rect) {
    let popup_area = centered_area(area, 60, 70);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "tocmap - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];
    lines.extend(HELP.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(
                format!("  {:<10}", key),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(*action),
        ])
    }));

    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help "),
    );
    frame.render_widget(help, popup_area);
}

fn centered_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, UiConfig};
    use crate::diagram::HeadingTransformer;
    use crate::host::MarkdownFile;
    use crate::sync::OutlineView;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn app(content: &str) -> App {
        let config = Config::default();
        let host = MarkdownFile::from_content(content, &config.document);
        let outline = OutlineView::new(host, Box::new(HeadingTransformer), config);
        App::new(outline, "doc.md".to_string(), &UiConfig::default())
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_render_shows_both_panes() {
        let mut app = app("# Guide\ntext\n## Setup\n## Usage\n");
        let screen = screen(&mut app);
        assert!(screen.contains("tocmap - doc.md - 3 headings"));
        assert!(screen.contains("Document"));
        assert!(screen.contains("Mindmap"));
        assert!(screen.contains("▼ Guide"));
        assert!(screen.contains("Setup"));
    }

    #[test]
    fn test_render_sets_viewport_and_surface() {
        let mut app = app("# Guide\n## Setup\n");
        screen(&mut app);
        // 30 rows minus title, status and borders
        assert_eq!(app.outline.host().viewport_lines(), 25);
        let surface = app.outline.view().unwrap().surface();
        assert_eq!(surface.height, 25.0 * 20.0);
    }

    #[test]
    fn test_render_empty_document() {
        let mut app = app("just text\n");
        let screen = screen(&mut app);
        assert!(screen.contains("No headings in this document"));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#FFEB3B"), Some(Color::Rgb(0xFF, 0xEB, 0x3B)));
        assert_eq!(parse_color("not a color"), None);
    }
}
