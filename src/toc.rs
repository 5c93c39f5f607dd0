//! Table of contents extraction from rendered HTML.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])([^>]*)>(.*?)</h[1-6]\s*>").expect("HEADING_RE is a valid regex")
});
static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*"([^"]*)""#).expect("ID_ATTR_RE is a valid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE is a valid regex"));

/// One heading in the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Anchor id to scroll to.
    pub id: String,
    /// Heading text with inner tags removed.
    pub text: String,
    /// Heading level, 1 through 6.
    pub level: u8,
}

/// Extracts the heading outline of `html` in document order.
///
/// An existing `id` attribute is used verbatim. Otherwise the id is derived
/// from the heading text with [`slugify`], falling back to
/// `heading-{level}-{index}` when nothing survives.
///
/// Identical headings produce identical ids; no suffix is added.
#[must_use]
pub fn extract_toc(html: &str) -> Vec<TocEntry> {
    let mut toc: Vec<TocEntry> = Vec::new();

    for caps in HEADING_RE.captures_iter(html) {
        let level = caps[1].parse::<u8>().unwrap_or(1);
        let text = TAG_RE.replace_all(&caps[3], "").into_owned();

        let mut id = ID_ATTR_RE
            .captures(&caps[2])
            .map(|id| id[1].to_string())
            .unwrap_or_default();
        if id.is_empty() {
            id = slugify(&text);
        }
        if id.is_empty() {
            id = format!("heading-{level}-{}", toc.len());
        }

        toc.push(TocEntry { id, text, level });
    }

    log::debug!("Extracted {} headings", toc.len());
    toc
}

/// Derives an anchor id from heading text.
///
/// - Lowercase
/// - Whitespace runs become a hyphen
/// - Only kana, common kanji, ASCII letters, digits and hyphens are kept
/// - Repeated hyphens collapse, leading/trailing hyphens are trimmed
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                kept.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if is_slug_char(c) {
            kept.push(c);
        }
    }

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

const fn is_slug_char(c: char) -> bool {
    matches!(
        c,
        '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{4E00}'..='\u{9FAF}'
            | 'a'..='z'
            | '0'..='9'
            | '-'
    )
}
