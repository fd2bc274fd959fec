//! A markdown file on disk (or in memory) as a host document.
//!
//! Document space is measured in pixel-like units: line `n` sits at
//! `n * line_height`. The scroll position is kept in whole lines.

use crate::config::DocumentConfig;
use crate::error::{Error, Result};
use crate::host::watcher::{FileWatcher, diff_lines};
use crate::host::{ChangeSink, HostDocument, RawHeading, Subscription, Viewport};
use crate::parser::{self, ParsedHeading};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Handle to a heading of a [`MarkdownFile`].
///
/// A handle is identified by its ordinal alone, so it keeps resolving to
/// the same heading when body edits shift lines. `line` is the source line
/// at the time the handle was taken.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeadingRef {
    /// Position among the document's headings
    pub ordinal: usize,
    /// Zero-based source line
    pub line: usize,
}

impl PartialEq for HeadingRef {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl Eq for HeadingRef {}

impl std::hash::Hash for HeadingRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
    }
}

#[derive(Debug, Clone)]
struct HeadingHighlight {
    ordinal: usize,
    color: String,
    until: Instant,
}

pub struct MarkdownFile {
    path: Option<PathBuf>,
    content: String,
    headings: Vec<ParsedHeading>,
    line_height: f64,
    font_size: f64,
    scroll: usize,
    viewport_lines: usize,
    highlight: Option<HeadingHighlight>,
    /// Set by the watcher thread when the file was written
    dirty: Arc<AtomicBool>,
    /// Observer installed by the change detector
    sink: Arc<Mutex<Option<ChangeSink>>>,
}

impl MarkdownFile {
    /// Open a markdown file.
    pub fn open(path: &Path, config: &DocumentConfig) -> Result<Self> {
        let (content, headings) = parser::parse_file(path)?;
        let mut file = Self::from_content(content, config);
        file.headings = headings;
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Host a document that only lives in memory.
    pub fn from_content(content: impl Into<String>, config: &DocumentConfig) -> Self {
        let content = content.into();
        let headings = parser::parse_headings(&content);
        Self {
            path: None,
            content,
            headings,
            line_height: config.line_height,
            font_size: config.font_size,
            scroll: 0,
            viewport_lines: 40,
            highlight: None,
            dirty: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the document text, reporting the edit to an installed observer.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if let Ok(slot) = self.sink.lock() {
            if let Some(sink) = slot.as_ref() {
                let old: Vec<String> = self.content.lines().map(str::to_owned).collect();
                let new: Vec<String> = content.lines().map(str::to_owned).collect();
                for mutation in diff_lines(&old, &new) {
                    sink.record(mutation);
                }
            }
        }
        self.headings = parser::parse_headings(&content);
        self.content = content;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// Top visible line.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn set_scroll(&mut self, line: usize) {
        self.scroll = line.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.set_scroll(self.scroll.saturating_add_signed(delta));
    }

    pub fn viewport_lines(&self) -> usize {
        self.viewport_lines
    }

    pub fn set_viewport_lines(&mut self, lines: usize) {
        self.viewport_lines = lines.max(1);
    }

    fn max_scroll(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// The highlighted heading line and its color, while the pulse lasts.
    pub fn heading_highlight(&self, now: Instant) -> Option<(usize, &str)> {
        let highlight = self.highlight.as_ref().filter(|h| now < h.until)?;
        let heading = self.headings.get(highlight.ordinal)?;
        Some((heading.line, highlight.color.as_str()))
    }

    /// Re-read the file if the watcher saw a write since the last read.
    ///
    /// Returns true if the content was reloaded.
    pub fn reload_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    fn reload(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        if content != self.content {
            self.headings = parser::parse_headings(&content);
            self.content = content;
            self.scroll = self.scroll.min(self.max_scroll());
        }
        Ok(())
    }

    /// Nearest heading at or above `line`.
    pub fn heading_at_or_above(&self, line: usize) -> Option<HeadingRef> {
        self.headings
            .iter()
            .enumerate()
            .take_while(|(_, h)| h.line <= line)
            .last()
            .map(|(ordinal, h)| HeadingRef {
                ordinal,
                line: h.line,
            })
    }

    /// Level of the heading on `line`, if there is one.
    pub fn heading_level_at(&self, line: usize) -> Option<usize> {
        self.headings
            .iter()
            .find(|h| h.line == line)
            .map(|h| h.level)
    }

    /// The current heading behind `element`, wherever it has moved.
    fn heading(&self, element: &HeadingRef) -> Option<&ParsedHeading> {
        self.headings.get(element.ordinal)
    }
}

impl HostDocument for MarkdownFile {
    type Element = HeadingRef;

    fn headings(&self) -> Vec<RawHeading<HeadingRef>> {
        self.headings
            .iter()
            .enumerate()
            .map(|(ordinal, h)| {
                let anchor = turbovault_parser::slugify(&h.text);
                RawHeading {
                    level: h.level,
                    text: h.text.clone(),
                    id: (!anchor.is_empty()).then_some(anchor),
                    element: HeadingRef {
                        ordinal,
                        line: h.line,
                    },
                }
            })
            .collect()
    }

    fn markdown(&self) -> String {
        self.content.clone()
    }

    fn heading_offset(&self, element: &HeadingRef) -> Option<f64> {
        self.heading(element)
            .map(|h| h.line as f64 * self.line_height)
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            top: self.scroll as f64 * self.line_height,
            height: self.viewport_lines as f64 * self.line_height,
        }
    }

    fn base_font_size(&self) -> Option<f64> {
        (self.font_size > 0.0).then_some(self.font_size)
    }

    fn scroll_into_view(&mut self, element: &HeadingRef, top_offset: f64) {
        let Some(offset) = self.heading_offset(element) else {
            return;
        };
        let target = ((offset - top_offset).max(0.0) / self.line_height).floor();
        self.set_scroll(target as usize);
    }

    fn highlight_heading(&mut self, element: &HeadingRef, color: &str, duration: Duration) {
        if self.heading(element).is_none() {
            return;
        }
        self.highlight = Some(HeadingHighlight {
            ordinal: element.ordinal,
            color: color.to_string(),
            until: Instant::now() + duration,
        });
    }

    fn clear_heading_styling(&mut self, element: &HeadingRef) {
        if self
            .highlight
            .as_ref()
            .is_some_and(|h| h.ordinal == element.ordinal)
        {
            self.highlight = None;
        }
    }

    fn refresh(&mut self) -> Result<()> {
        self.dirty.store(false, Ordering::SeqCst);
        self.reload()
    }

    fn observe(&mut self, sink: ChangeSink) -> Result<Subscription> {
        let watcher = match &self.path {
            Some(path) => {
                let dirty = self.dirty.clone();
                Some(FileWatcher::new(path, sink.clone(), move || {
                    dirty.store(true, Ordering::SeqCst)
                })?)
            }
            None => None,
        };

        if let Ok(mut slot) = self.sink.lock() {
            *slot = Some(sink);
        }

        let slot = self.sink.clone();
        Ok(Subscription::new(move || {
            drop(watcher);
            if let Ok(mut slot) = slot.lock() {
                *slot = None;
            }
        }))
    }
}
