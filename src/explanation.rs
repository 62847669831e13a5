//! Sanitizing formatter for model explanation text.
//!
//! The prediction service returns free-form, model-generated text that may
//! contain markup. Instead of trusting it as HTML, this module maps an
//! allow-listed subset (`**strong**`, `<b>`/`<strong>`, `<br>`, `#` headings,
//! list items) onto a typed block/span tree and strips every other tag. The
//! renderer consumes the tree directly, so no string is ever interpreted as
//! markup.

use std::sync::OnceLock;

use regex::Regex;

/// A contiguous run of text with one emphasis level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
}

/// One renderable block of formatted explanation text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Section heading (`#`-prefixed line).
    Heading(String),
    /// List item (`-`, `*`, or `1.`-prefixed line).
    Bullet(Vec<Span>),
    /// Plain paragraph line.
    Paragraph(Vec<Span>),
}

/// Format untrusted explanation text into renderable blocks.
pub fn format_text(raw: &str) -> Vec<Block> {
    let normalized = normalize_markup(raw);
    normalized
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(block_for_line)
        .collect()
}

/// Map allow-listed tags to text markers and strip everything else.
fn normalize_markup(raw: &str) -> String {
    static STRONG_TAGS: OnceLock<Regex> = OnceLock::new();
    static BREAK_TAGS: OnceLock<Regex> = OnceLock::new();
    static OTHER_TAGS: OnceLock<Regex> = OnceLock::new();

    let strong = STRONG_TAGS.get_or_init(|| {
        Regex::new(r"(?i)</?(?:b|strong)\s*>").expect("strong tag pattern")
    });
    let breaks =
        BREAK_TAGS.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("break tag pattern"));
    let other = OTHER_TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

    let text = strong.replace_all(raw, "**");
    let text = breaks.replace_all(&text, "\n");
    other.replace_all(&text, "").into_owned()
}

fn block_for_line(line: &str) -> Block {
    if let Some(heading) = line.strip_prefix('#') {
        return Block::Heading(heading.trim_start_matches('#').trim().to_string());
    }
    if let Some(item) = list_item_text(line) {
        return Block::Bullet(parse_spans(item));
    }
    Block::Paragraph(parse_spans(line))
}

fn list_item_text(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(rest.trim_start());
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return Some(rest.trim_start());
        }
    }
    None
}

/// Split a line on `**` markers, alternating plain and strong runs.
///
/// An unmatched trailing marker falls back to plain text rather than
/// emphasizing the rest of the line.
fn parse_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut strong = false;
    let mut parts = line.split("**").peekable();
    while let Some(part) = parts.next() {
        let unmatched = strong && parts.peek().is_none();
        if !part.is_empty() {
            if strong && !unmatched {
                spans.push(Span::Strong(part.to_string()));
            } else {
                spans.push(Span::Text(part.to_string()));
            }
        }
        strong = !strong;
    }
    spans
}
