//! HTML-safe span replacement.
//!
//! Matching runs over raw markup, so regions that must never be rewritten are
//! swapped for opaque placeholder tokens first: attribute values, heading
//! contents and, on request, the contents of links generated by an earlier
//! pass. Replacement then happens back to front on the substituted string and
//! the placeholders are restored afterwards.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::candidate::CandidateKind;
use crate::matcher::Match;

/// Opens a placeholder token (Unicode private use area).
const TOKEN_OPEN: char = '\u{E000}';
/// Closes a placeholder token.
const TOKEN_CLOSE: char = '\u{E001}';

static ATTRIBUTE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"="([^"]*)""#).expect("ATTRIBUTE_VALUE_RE is a valid regex"));
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<h[1-6](?:\s[^>]*)?>)(.*?)(</h[1-6]\s*>)")
        .expect("HEADING_RE is a valid regex")
});
static CHAR_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("CHAR_REFERENCE_RE is a valid regex"));

/// Pass-scoped record of substituted regions.
///
/// Tokens share a prefix that does not occur in the input, so restoring a
/// token can never hit document text.
#[derive(Debug, Clone)]
pub struct PlaceholderMap {
    prefix: String,
    /// Matches `{prefix}{index}{TOKEN_CLOSE}`; `None` if it failed to build.
    token_re: Option<Regex>,
    originals: Vec<String>,
}

impl PlaceholderMap {
    /// Creates an empty map whose token prefix is absent from `input`.
    #[must_use]
    pub fn for_input(input: &str) -> Self {
        let mut nonce: u32 = 0;
        let mut prefix = format!("{TOKEN_OPEN}{nonce:x}:");
        while input.contains(&prefix) {
            nonce += 1;
            prefix = format!("{TOKEN_OPEN}{nonce:x}:");
        }

        let pattern = format!(
            "{}([0-9]+){}",
            regex::escape(&prefix),
            regex::escape(&TOKEN_CLOSE.to_string())
        );
        let token_re = match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::warn!("Failed to build placeholder pattern: {e}");
                None
            }
        };

        Self {
            prefix,
            token_re,
            originals: Vec::new(),
        }
    }

    /// Records `original` and returns the token standing in for it.
    pub fn insert(&mut self, original: &str) -> String {
        let token = format!("{}{}{TOKEN_CLOSE}", self.prefix, self.originals.len());
        self.originals.push(original.to_string());
        token
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Returns the byte ranges of this map's tokens in `text`.
    fn token_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.token_re
            .as_ref()
            .map(|re| re.find_iter(text).map(|m| m.range()).collect())
            .unwrap_or_default()
    }

    /// Puts every original region back.
    ///
    /// Each round replaces all tokens in one scan. Originals may hold older
    /// tokens (a heading containing protected attributes), which the next
    /// round unwraps, so the number of rounds is the nesting depth.
    #[must_use]
    pub fn restore(&self, mut text: String) -> String {
        if self.is_empty() {
            return text;
        }
        let Some(token_re) = &self.token_re else {
            return text;
        };

        let mut restored = vec![false; self.originals.len()];
        loop {
            let mut progressed = false;
            let next = token_re.replace_all(&text, |caps: &Captures<'_>| {
                let index = caps[1].parse::<usize>().ok();
                match index.and_then(|i| self.originals.get(i).map(|o| (i, o))) {
                    Some((i, original)) if !restored[i] => {
                        restored[i] = true;
                        progressed = true;
                        original.clone()
                    }
                    _ => caps[0].to_string(),
                }
            });
            if !progressed {
                break;
            }
            text = next.into_owned();
        }

        for (index, _) in restored.iter().enumerate().filter(|(_, done)| !**done) {
            log::warn!("Placeholder {index} vanished during rewrite");
        }
        text
    }
}

/// HTML with its sensitive regions swapped for placeholders.
#[derive(Debug, Clone)]
pub struct ProtectedHtml {
    text: String,
    placeholders: PlaceholderMap,
    /// Sorted byte ranges of tags, placeholder tokens and character
    /// references.
    markup: Vec<Range<usize>>,
}

impl ProtectedHtml {
    /// Substitutes placeholders into `html`.
    ///
    /// Contents of links previously generated for each kind in `shielded`
    /// are protected first, then attribute values, then heading contents.
    #[must_use]
    pub fn new(html: &str, shielded: &[CandidateKind]) -> Self {
        let mut placeholders = PlaceholderMap::for_input(html);
        let mut text = html.to_string();

        for &kind in shielded {
            text = protect_generated_links(&text, kind, &mut placeholders);
        }

        text = ATTRIBUTE_VALUE_RE
            .replace_all(&text, |caps: &Captures<'_>| {
                format!("=\"{}\"", placeholders.insert(&caps[1]))
            })
            .into_owned();

        text = HEADING_RE
            .replace_all(&text, |caps: &Captures<'_>| {
                format!("{}{}{}", &caps[1], placeholders.insert(&caps[2]), &caps[3])
            })
            .into_owned();

        let markup = markup_ranges(&text, &placeholders);
        Self {
            text,
            placeholders,
            markup,
        }
    }

    /// Returns the substituted string that matching must run against.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn placeholders(&self) -> &PlaceholderMap {
        &self.placeholders
    }

    /// Returns true if `start..end` lies entirely in plain text.
    #[must_use]
    pub fn is_text_span(&self, start: usize, end: usize) -> bool {
        // first markup range ending after `start`
        let idx = self.markup.partition_point(|r| r.end <= start);
        self.markup.get(idx).is_none_or(|r| r.start >= end)
    }

    /// Replaces each match with `link_builder`'s output and restores the
    /// placeholders.
    ///
    /// Matches must not overlap. The output is built in one forward pass.
    #[must_use]
    pub fn rewrite<F>(self, mut matches: Vec<Match<'_>>, link_builder: F) -> String
    where
        F: Fn(&Match<'_>) -> String,
    {
        let Self { text, placeholders, .. } = self;

        matches.sort_by_key(Match::start);
        let mut output = String::with_capacity(text.len() + matches.len() * 48);
        let mut last = 0;
        for m in &matches {
            if m.start() < last {
                log::warn!("Skipping overlapping match at {}", m.start());
                continue;
            }
            output.push_str(&text[last..m.start()]);
            output.push_str(&link_builder(m));
            last = m.end();
        }
        output.push_str(&text[last..]);

        placeholders.restore(output)
    }
}

/// Wraps link text by applying `select` to protected `html`.
///
/// `select` receives the substituted string and returns the matches to
/// replace; offsets must refer to that string.
#[must_use]
pub fn rewrite<'c, S, F>(
    html: &str,
    shielded: &[CandidateKind],
    select: S,
    link_builder: F,
) -> String
where
    S: FnOnce(&ProtectedHtml) -> Vec<Match<'c>>,
    F: Fn(&Match<'_>) -> String,
{
    let protected = ProtectedHtml::new(html, shielded);
    let matches = select(&protected);
    protected.rewrite(matches, link_builder)
}

/// Replaces the contents of generated links of `kind` with placeholders.
fn protect_generated_links(
    text: &str,
    kind: CandidateKind,
    placeholders: &mut PlaceholderMap,
) -> String {
    let pattern = format!(
        r#"(?s)(<span class="{}" {}="[^"]*">)(.*?)(</span>)"#,
        regex::escape(kind.css_class()),
        regex::escape(kind.data_attribute()),
    );
    let Ok(regex) = Regex::new(&pattern) else {
        return text.to_string();
    };
    regex
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], placeholders.insert(&caps[2]), &caps[3])
        })
        .into_owned()
}

/// Collects the byte ranges that are not plain text, in ascending order.
///
/// Tags, the placeholder tokens of `placeholders` and character references
/// count as markup. Other private-use characters are ordinary text.
fn markup_ranges(text: &str, placeholders: &PlaceholderMap) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (open, c) {
            (None, '<') => open = Some(i),
            (Some(start), '>') => {
                ranges.push(start..i + 1);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        ranges.push(start..text.len());
    }

    ranges.extend(placeholders.token_ranges(text));
    ranges.extend(CHAR_REFERENCE_RE.find_iter(text).map(|m| m.range()));
    ranges.sort_by_key(|r| r.start);

    // Coalesce so ends ascend along with starts
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}
