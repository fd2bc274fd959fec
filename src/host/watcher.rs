//! File system observer for the markdown file host.
//!
//! Watches the document file and translates each write into structural
//! mutations by diffing the previous and current lines, so the change
//! detector can ignore edits that never touch a heading.

use crate::error::Result;
use crate::host::{ChangeSink, Mutation, MutationTarget};
use crate::parser::{self, utils::get_heading_level};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{AccessKind, AccessMode, ModifyKind},
};
use std::path::{Path, PathBuf};

/// Watches one markdown file and reports mutations to a [`ChangeSink`].
///
/// Dropping the watcher stops observation.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// `on_write` runs on the watcher thread after every relevant write,
    /// heading-related or not.
    pub fn new(
        path: &Path,
        sink: ChangeSink,
        on_write: impl Fn() + Send + 'static,
    ) -> Result<Self> {
        let path = path.canonicalize()?;
        let mut previous = read_lines(&path).unwrap_or_default();
        let watched = path.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !is_relevant_event(&event, &watched) {
                        return;
                    }
                    let Some(lines) = read_lines(&watched) else {
                        tracing::debug!(path = %watched.display(), "file unreadable after change");
                        return;
                    };
                    for mutation in diff_lines(&previous, &lines) {
                        sink.record(mutation);
                    }
                    previous = lines;
                    on_write();
                }
                Err(err) => {
                    tracing::warn!(?err, "file watcher error");
                }
            },
        )?;

        // Watch the directory so editors that save via rename are still seen
        let target = path.parent().unwrap_or(path.as_path());
        watcher.watch(target, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), "watching document");

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    /// Get the watched path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_lines(path: &Path) -> Option<Vec<String>> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| content.lines().map(str::to_owned).collect())
}

/// Check if an event is a write to the watched file.
fn is_relevant_event(event: &Event, watched: &Path) -> bool {
    if !event.paths.iter().any(|p| p == watched) {
        return false;
    }

    matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Create(_)
    )
}

/// Describe the change from `old` to `new` as structural mutations.
///
/// Lines edited in place become heading or heading-text mutations when a
/// heading line is involved; inserted or removed line runs become one
/// child-list mutation flagged with whether the run contains a heading.
///
/// Edits can also change which lines parse as headings without touching a
/// heading line, such as opening or closing a code fence. When the parsed
/// outline differs but no line-level mutation says so, one more mutation
/// reports the headings that appeared or vanished.
pub fn diff_lines(old: &[String], new: &[String]) -> Vec<Mutation> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let removed = &old[prefix..old.len() - suffix];
    let added = &new[prefix..new.len() - suffix];

    if removed.is_empty() && added.is_empty() {
        return Vec::new();
    }

    let mut mutations = if removed.len() == added.len() {
        removed
            .iter()
            .zip(added)
            .filter(|(before, after)| before != after)
            .map(|(before, after)| {
                let target = match (get_heading_level(before), get_heading_level(after)) {
                    (None, None) => MutationTarget::Other,
                    (Some(was), Some(is)) if was == is => MutationTarget::HeadingText,
                    _ => MutationTarget::Heading,
                };
                Mutation::new(target)
            })
            .collect()
    } else {
        let has_heading = |lines: &[String]| lines.iter().any(|l| get_heading_level(l).is_some());
        vec![Mutation {
            target: MutationTarget::Other,
            added_heading: has_heading(added),
            removed_heading: has_heading(removed),
        }]
    };

    if !mutations.iter().any(Mutation::affects_headings) {
        mutations.extend(outline_shift(old, new));
    }
    mutations
}

/// Level and text of every heading the parser finds.
fn outline(lines: &[String]) -> Vec<(usize, String)> {
    parser::parse_headings(&lines.join("\n"))
        .into_iter()
        .map(|h| (h.level, h.text))
        .collect()
}

/// A mutation for headings that changed without a heading line being edited.
fn outline_shift(old: &[String], new: &[String]) -> Option<Mutation> {
    let (before, after) = (outline(old), outline(new));
    if before == after {
        return None;
    }

    let added_heading = after.iter().any(|h| !before.contains(h));
    let removed_heading = before.iter().any(|h| !after.contains(h));
    let target = if added_heading || removed_heading {
        MutationTarget::Other
    } else {
        MutationTarget::Heading
    };
    Some(Mutation {
        target,
        added_heading,
        removed_heading,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_owned).collect()
    }

    #[test]
    fn test_body_edit_is_not_heading_mutation() {
        let old = lines("# A\nbody\n## B");
        let new = lines("# A\nbody edited\n## B");
        let mutations = diff_lines(&old, &new);
        assert_eq!(mutations, vec![Mutation::new(MutationTarget::Other)]);
        assert!(!mutations[0].affects_headings());
    }

    #[test]
    fn test_heading_text_edit() {
        let old = lines("# A\nbody\n## B");
        let new = lines("# A\nbody\n## Bee");
        let mutations = diff_lines(&old, &new);
        assert_eq!(mutations, vec![Mutation::new(MutationTarget::HeadingText)]);
    }

    #[test]
    fn test_line_becomes_heading() {
        let old = lines("# A\nbody");
        let new = lines("# A\n## body");
        let mutations = diff_lines(&old, &new);
        assert_eq!(mutations, vec![Mutation::new(MutationTarget::Heading)]);
    }

    #[test]
    fn test_inserted_lines_with_heading() {
        let old = lines("# A\nend");
        let new = lines("# A\n## New\ntext\nend");
        let mutations = diff_lines(&old, &new);
        assert_eq!(mutations.len(), 1);
        assert!(mutations[0].added_heading);
        assert!(!mutations[0].removed_heading);
    }

    #[test]
    fn test_removed_plain_lines() {
        let old = lines("# A\none\ntwo\nend");
        let new = lines("# A\nend");
        let mutations = diff_lines(&old, &new);
        assert_eq!(mutations.len(), 1);
        assert!(!mutations[0].affects_headings());
    }

    #[test]
    fn test_opening_fence_hides_later_headings() {
        let old = lines("# A\n## B\ntext\n## C");
        let new = lines("# A\n```\n## B\ntext\n## C");
        let mutations = diff_lines(&old, &new);
        assert!(mutations.iter().any(Mutation::affects_headings));
        assert!(mutations.iter().any(|m| m.removed_heading));
    }

    #[test]
    fn test_closing_fence_reveals_headings() {
        let old = lines("# A\n```\ncode\n## B");
        let new = lines("# A\n```\ncode\n```\n## B");
        let mutations = diff_lines(&old, &new);
        assert!(mutations.iter().any(|m| m.added_heading));
    }

    #[test]
    fn test_identical_content() {
        let old = lines("# A\nbody");
        assert!(diff_lines(&old, &old.clone()).is_empty());
    }

    #[test]
    fn test_watcher_creation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "# Title\n").unwrap();
        let (tx, _rx) = mpsc::channel();
        let watcher = FileWatcher::new(file.path(), ChangeSink::new(tx), || {});
        assert!(watcher.is_ok());
    }
}
