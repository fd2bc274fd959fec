//! Utility functions for heading text.
//!
//! Shared helpers used by the outline extractor, the diagram transform and
//! the file observer.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Extract the heading level from a line of markdown text.
///
/// Returns `Some(level)` if the line is a valid ATX heading (1-6 #'s followed by whitespace),
/// or `None` otherwise.
///
/// # Examples
///
/// ```
/// # use tocmap::parser::utils::get_heading_level;
/// assert_eq!(get_heading_level("# Title"), Some(1));
/// assert_eq!(get_heading_level("## Section"), Some(2));
/// assert_eq!(get_heading_level("not a heading"), None);
/// assert_eq!(get_heading_level("#NoSpace"), None);
/// ```
pub fn get_heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let mut level = 0;

    for ch in trimmed.chars() {
        if ch == '#' {
            level += 1;
        } else if ch.is_whitespace() {
            return if level > 0 && level <= 6 {
                Some(level)
            } else {
                None
            };
        } else {
            break;
        }
    }

    None
}

/// Trim heading text and collapse internal whitespace runs to a single space.
///
/// Heading text feeds both the outline paths and the markdown handed to the
/// diagram transform, so both sides see the same normalized string.
pub fn normalize_heading_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for use as node markup content.
///
/// # Examples
///
/// ```
/// # use tocmap::parser::utils::escape_markup;
/// assert_eq!(escape_markup("A & <B>"), "A &amp; &lt;B&gt;");
/// ```
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Decode node markup to plain text: strip tags, then decode entities.
///
/// # Examples
///
/// ```
/// # use tocmap::parser::utils::decode_markup;
/// assert_eq!(decode_markup("<strong>A</strong> &amp; B"), "A & B");
/// assert_eq!(decode_markup("plain"), "plain");
/// ```
pub fn decode_markup(markup: &str) -> Cow<'_, str> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static ENTITY: OnceLock<Regex> = OnceLock::new();

    if !markup.contains(['<', '&']) {
        return Cow::Borrowed(markup);
    }

    let tag_re = TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let entity_re =
        ENTITY.get_or_init(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

    let stripped = tag_re.replace_all(markup, "");
    let decoded = entity_re.replace_all(&stripped, |caps: &Captures| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    Cow::Owned(decoded.into_owned())
}

fn decode_entity(name: &str) -> Option<String> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(ch.to_string())
}
