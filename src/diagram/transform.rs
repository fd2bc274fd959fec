//! Markdown to diagram tree transform.

use crate::diagram::DiagramNode;
use crate::error::Result;
use crate::parser::utils::{escape_markup, get_heading_level};

/// Turns markdown into a diagram tree. Must be pure.
pub trait Transformer {
    fn transform(&self, markdown: &str) -> Result<DiagramNode>;
}

/// Builds one node per heading, nested by level.
///
/// Heading lines are read literally: the text after the `#` marker is taken
/// as is, never parsed again as inline markdown. A heading becomes a child
/// of the nearest preceding heading with a lower level. Several top-level
/// headings are grouped under a contentless root.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingTransformer;

impl Transformer for HeadingTransformer {
    fn transform(&self, markdown: &str) -> Result<DiagramNode> {
        // Open chain of (level, node); closed nodes are attached to their parent
        let mut open: Vec<(usize, DiagramNode)> = Vec::new();
        let mut roots = Vec::new();

        fn close(open: &mut Vec<(usize, DiagramNode)>, roots: &mut Vec<DiagramNode>) {
            if let Some((_, node)) = open.pop() {
                match open.last_mut() {
                    Some((_, parent)) => parent.children.push(node),
                    None => roots.push(node),
                }
            }
        }

        for line in markdown.lines() {
            let Some(level) = get_heading_level(line) else {
                continue;
            };
            let text = line.trim_start()[level..].trim();
            if text.is_empty() {
                continue;
            }
            while open.last().is_some_and(|(open_level, _)| *open_level >= level) {
                close(&mut open, &mut roots);
            }
            open.push((level, DiagramNode::new(escape_markup(text))));
        }
        while !open.is_empty() {
            close(&mut open, &mut roots);
        }

        let mut root = if roots.len() == 1 {
            roots.remove(0)
        } else {
            DiagramNode::default().with_children(roots)
        };
        root.set_depth(0);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_root() {
        let root = HeadingTransformer
            .transform("# Title\n## A\n### A1\n## B\n")
            .unwrap();
        assert_eq!(root.content, "Title");
        assert_eq!(root.depth, 0);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].content, "A1");
        assert_eq!(root.children[0].children[0].depth, 2);
    }

    #[test]
    fn test_multiple_roots_grouped() {
        let root = HeadingTransformer.transform("# One\n# Two\n## Sub\n").unwrap();
        assert_eq!(root.content, "");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].children[0].content, "Sub");
        assert_eq!(root.children[1].children[0].depth, 2);
    }

    #[test]
    fn test_level_jump_nests_under_nearest_lower() {
        let root = HeadingTransformer
            .transform("# Overview\n### Details\n### More\n")
            .unwrap();
        let children: Vec<_> = root.children.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(children, vec!["Details", "More"]);
    }

    #[test]
    fn test_content_is_escaped() {
        let root = HeadingTransformer.transform("# Q & A\n").unwrap();
        assert_eq!(root.content, "Q &amp; A");
        assert_eq!(root.text(), "Q & A");
    }

    #[test]
    fn test_heading_text_is_taken_literally() {
        let root = HeadingTransformer
            .transform("# Vec<T> api\n## *important*\n## Issue #\n## C#\nplain line\n")
            .unwrap();
        assert_eq!(root.text(), "Vec<T> api");
        let children: Vec<_> = root.children.iter().map(|c| c.text()).collect();
        assert_eq!(children, vec!["*important*", "Issue #", "C#"]);
    }

    #[test]
    fn test_empty_markdown() {
        let root = HeadingTransformer.transform("").unwrap();
        assert!(root.is_empty());
    }
}
