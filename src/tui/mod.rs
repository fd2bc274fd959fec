mod app;
mod ui;

pub use app::{App, Focus};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Run the TUI application.
///
/// Draws, waits up to 100ms for a key, then advances the outline's timers
/// so debounced rebuilds, animations and highlight pulses progress while
/// the user is idle.
pub fn run(terminal: &mut DefaultTerminal, app: App) -> Result<()> {
    let mut app = app;

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(&mut app, key) {
                    break;
                }
            }
        }

        app.tick(Instant::now());
    }

    tracing::info!("leaving tui");
    Ok(())
}

/// Returns false when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return false;
    }

    // Help popup swallows everything but close and quit
    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc => app.toggle_help(),
            KeyCode::Char('q') => return false,
            _ => {}
        }
        return true;
    }

    app.status_message = None;
    match key.code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            Focus::Document => app.scroll_document(1),
            Focus::Mindmap => app.move_selection(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            Focus::Document => app.scroll_document(-1),
            Focus::Mindmap => app.move_selection(-1),
        },
        KeyCode::PageDown | KeyCode::Char('d') => {
            let page = app.outline.host().viewport_lines() as isize / 2;
            app.scroll_document(page);
        }
        KeyCode::PageUp | KeyCode::Char('u') => {
            let page = app.outline.host().viewport_lines() as isize / 2;
            app.scroll_document(-page);
        }
        KeyCode::Enter => app.activate(),
        KeyCode::Char(' ') => app.toggle_selected_fold(),
        KeyCode::Char('f') => app.fit_to_current_heading(),
        KeyCode::Char('F') => app.fit(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') => app.zoom_out(),
        KeyCode::Char(']') => app.change_expand_level(1),
        KeyCode::Char('[') => app.change_expand_level(-1),
        KeyCode::Char('>') => app.resize_diagram(10),
        KeyCode::Char('<') => app.resize_diagram(-10),
        KeyCode::Char('l') => app.toggle_live(),
        KeyCode::Char('s') => app.toggle_follow(),
        KeyCode::Char('S') => app.save_config(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('m') => app.toggle_diagram(),
        _ => {}
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, UiConfig};
    use crate::diagram::HeadingTransformer;
    use crate::host::MarkdownFile;
    use crate::sync::OutlineView;

    fn app() -> App {
        let config = Config::default();
        let host = MarkdownFile::from_content("# A\ntext\n## B\n## C\n", &config.document);
        let outline = OutlineView::new(host, Box::new(HeadingTransformer), config);
        App::new(outline, "doc.md".to_string(), &UiConfig::default())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
    }

    #[test]
    fn test_keys_follow_focus() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('j')));
        assert_eq!(app.outline.host().scroll(), 1);
        assert_eq!(app.selected.as_deref(), Some("A"));

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.outline.host().scroll(), 1);
        assert_eq!(app.selected.as_deref(), Some("A\nB"));
    }

    #[test]
    fn test_help_swallows_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('m'));
        assert!(app.outline.is_visible());
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        press(&mut app, KeyCode::Char('m'));
        assert!(!app.outline.is_visible());
    }
}
