//! Markdown heading extraction.
//!
//! All parsing is delegated to `turbovault-parser` for code-block-aware
//! OFM (Obsidian Flavored Markdown) support. Inline formatting is stripped
//! from heading text by the parser, so `## **Bold** Section` yields
//! `Bold Section`.

pub mod utils;

use crate::error::{Error, Result};
use std::path::Path;

/// A heading found in markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeading {
    /// Heading level (1-6)
    pub level: usize,
    /// Heading text with inline formatting stripped
    pub text: String,
    /// Byte offset of the heading line
    pub offset: usize,
    /// Zero-based line number of the heading
    pub line: usize,
}

/// Read a markdown file, returning its content and headings.
pub fn parse_file(path: &Path) -> Result<(String, Vec<ParsedHeading>)> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let headings = parse_headings(&content);
    Ok((content, headings))
}

/// Parse markdown content and extract headings in document order.
pub fn parse_headings(content: &str) -> Vec<ParsedHeading> {
    let mut line = 0;
    let mut scanned = 0;

    turbovault_parser::parse_headings(content)
        .into_iter()
        .map(|h| {
            let offset = h.position.offset.min(content.len());
            // Offsets are increasing, so count newlines incrementally.
            if offset >= scanned {
                line += content.as_bytes()[scanned..offset]
                    .iter()
                    .filter(|&&b| b == b'\n')
                    .count();
                scanned = offset;
            } else {
                line = content.as_bytes()[..offset]
                    .iter()
                    .filter(|&&b| b == b'\n')
                    .count();
                scanned = offset;
            }

            ParsedHeading {
                level: h.level as usize,
                text: h.text,
                offset,
                line,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headings() {
        let md = r#"# Title
Some content

## Section 1
More content

### Subsection
Details

## Section 2
End"#;

        let headings = parse_headings(md);
        assert_eq!(headings.len(), 4);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].text, "Section 1");
        assert_eq!(headings[2].level, 3);
    }

    #[test]
    fn test_parse_headings_with_bold() {
        let md = r#"# Title

## **Bold** Section

### Normal Subsection"#;

        let headings = parse_headings(md);
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[1].text, "Bold Section");
    }

    #[test]
    fn test_headings_store_lines() {
        let md = "# First\nContent here\n\n## Second\nMore content";

        let headings = parse_headings(md);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].offset, 0);
        assert_eq!(headings[0].line, 0);
        assert_eq!(headings[1].line, 3);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
