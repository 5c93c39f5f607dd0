//! Markdown to HTML rendering using pulldown-cmark.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;

use crate::toc::slugify;

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("BLANK_RUN_RE is a valid regex"));
static H1_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+\S.*$").expect("H1_LINE_RE is a valid regex"));

/// Normalizes page markdown before rendering.
///
/// - `\r\n` and lone `\r` become `\n`
/// - Runs of three or more newlines collapse to two
/// - Level-1 heading lines are dropped (the page title is shown separately)
#[must_use]
pub fn preprocess_markdown(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = BLANK_RUN_RE.replace_all(&normalized, "\n\n");
    H1_LINE_RE.replace_all(&collapsed, "").into_owned()
}

/// Renders markdown to HTML.
///
/// Tables, footnotes, strikethrough, task lists and heading attributes are
/// enabled. Soft line breaks become `<br />`, and headings without an
/// explicit id get one derived from their text with the same slug function
/// the outline uses.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, options)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect();

    assign_heading_ids(&mut events);

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());
    output
}

/// Gives every heading without an id one generated from its text.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }

        let slug = slugify(&heading_text(&events[i + 1..]));
        if slug.is_empty() {
            continue;
        }
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

/// Collects the plain text of a heading up to its end event.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}
