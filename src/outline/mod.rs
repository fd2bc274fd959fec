//! Heading outline extraction and path identity.
//!
//! Every heading gets a path: the newline-joined text of its ancestor chain.
//! Paths are the only identity that survives a diagram rebuild, so the same
//! grammar is used by the diagram annotator.

use crate::host::HostDocument;
use crate::parser::utils::normalize_heading_text;
use serde::Serialize;
use std::fmt::Write;

/// Joins path segments. Heading text is single-line, so it never contains one.
pub const PATH_SEPARATOR: char = '\n';

/// A heading of the current document, recomputed on every extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingInfo<E> {
    pub level: usize,
    pub text: String,
    pub id: String,
    /// Ordinal position among the extracted headings
    pub index: usize,
    pub path: String,
    #[serde(skip)]
    pub element: E,
}

/// Ancestor chain while walking headings in document order.
///
/// Skipped levels hold `None`, so an H1 followed by an H3 keeps the H3 at
/// depth 3 without inventing an H2.
#[derive(Debug, Default, Clone)]
pub struct PathStack {
    slots: Vec<Option<String>>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a heading at `level` and return its path.
    pub fn push(&mut self, level: usize, text: &str) -> String {
        let depth = level.saturating_sub(1);
        self.slots.truncate(depth);
        self.slots.resize(depth, None);
        self.slots.push(Some(text.to_string()));
        self.path()
    }

    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in self.slots.iter().flatten() {
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(segment);
        }
        path
    }
}

/// Extract the host's headings in document order, with their paths.
///
/// Headings with empty text are skipped and do not take an index.
pub fn extract_headings<H: HostDocument>(host: &H) -> Vec<HeadingInfo<H::Element>> {
    let mut stack = PathStack::new();
    let mut headings = Vec::new();

    for raw in host.headings() {
        let text = normalize_heading_text(&raw.text);
        if text.is_empty() {
            continue;
        }
        let index = headings.len();
        let path = stack.push(raw.level, &text);
        headings.push(HeadingInfo {
            level: raw.level,
            id: raw
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("heading-{index}")),
            text,
            index,
            path,
            element: raw.element,
        });
    }

    headings
}

/// Paths of every ancestor of `path`, outermost first.
///
/// ```
/// # use tocmap::outline::ancestor_paths;
/// assert_eq!(ancestor_paths("A\nB\nC"), vec!["A", "A\nB"]);
/// assert!(ancestor_paths("A").is_empty());
/// ```
pub fn ancestor_paths(path: &str) -> Vec<&str> {
    path.match_indices(PATH_SEPARATOR)
        .map(|(i, _)| &path[..i])
        .collect()
}

/// Cheap fingerprint of the heading list, used to skip redundant rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutlineHash(String);

impl<E> From<&[HeadingInfo<E>]> for OutlineHash {
    fn from(headings: &[HeadingInfo<E>]) -> Self {
        let mut hash = String::new();
        for h in headings {
            let _ = write!(hash, "{}:{}|", h.index, h.path);
        }
        Self(hash)
    }
}

/// Markdown containing only the headings, fed to the diagram transform.
pub fn build_toc_markdown<E>(headings: &[HeadingInfo<E>]) -> String {
    let mut markdown = String::new();
    for h in headings {
        markdown.push_str(&"#".repeat(h.level));
        markdown.push(' ');
        markdown.push_str(&h.text);
        markdown.push('\n');
    }
    markdown
}
