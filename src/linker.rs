//! Link orchestration: terms first, then documents.

use crate::candidate::{self, Candidate, CandidateKind};
use crate::matcher::{self, Match};
use crate::rewriter;
use crate::rules::{ExceptionRule, RuleSet};

/// Auto-links term and document titles in rendered HTML.
///
/// Holds the compiled exception rules so one instance can process many
/// pages.
#[derive(Debug, Clone, Default)]
pub struct Linker {
    rules: RuleSet,
    /// Keep the document pass out of term link contents.
    shield_term_links: bool,
}

impl Linker {
    /// Creates a linker applying `rules` in order.
    #[must_use]
    pub fn new(rules: &[ExceptionRule]) -> Self {
        Self {
            rules: RuleSet::compile(rules),
            shield_term_links: false,
        }
    }

    /// Sets whether document links may be nested inside term links.
    ///
    /// By default document titles are also matched in the text of term
    /// links, so a document link can sit inside a term link. With shielding
    /// on, term link contents are left alone by the document pass.
    #[must_use]
    pub const fn with_term_link_shielding(mut self, shield: bool) -> Self {
        self.shield_term_links = shield;
        self
    }

    /// Links `terms`, then `docs`, inside `html`.
    ///
    /// `current_title` is the title of the page being rendered, used by the
    /// self-reference rule. Document matching runs over the term-linked
    /// output, layering document links on top of the term markup.
    #[must_use]
    pub fn process(
        &self,
        html: &str,
        terms: &[Candidate],
        docs: &[Candidate],
        current_title: &str,
    ) -> String {
        let html = self.link_candidates(html, terms, current_title, &[]);
        let shielded: &[CandidateKind] = if self.shield_term_links {
            &[CandidateKind::Term]
        } else {
            &[]
        };
        self.link_candidates(&html, docs, current_title, shielded)
    }

    /// Runs one linking pass over `candidates`.
    ///
    /// Contents of generated links of the `shielded` kinds are left alone.
    #[must_use]
    pub fn link_candidates(
        &self,
        html: &str,
        candidates: &[Candidate],
        current_title: &str,
        shielded: &[CandidateKind],
    ) -> String {
        let prepared = candidate::prepare(candidates);
        if prepared.is_empty() {
            return html.to_string();
        }

        rewriter::rewrite(
            html,
            shielded,
            |protected| {
                let text = protected.as_str();

                let found: Vec<Match<'_>> = matcher::find_matches(text, prepared.iter().copied())
                    .into_iter()
                    .filter(|m| protected.is_text_span(m.start(), m.end()))
                    .collect();
                let found_count = found.len();

                let linked: Vec<Match<'_>> = matcher::resolve_overlaps(found)
                    .into_iter()
                    .filter(|m| {
                        let suppress = self.rules.should_suppress(m, text, current_title);
                        if suppress {
                            log::trace!("Skipping link for '{}' due to exception rules", m.text());
                        }
                        !suppress
                    })
                    .collect();

                log::debug!(
                    "Linking pass: {} candidates, {} matches, {} links",
                    prepared.len(),
                    found_count,
                    linked.len()
                );
                linked
            },
            link_markup,
        )
    }
}

/// Links `terms` then `docs` in `html` using `rules`.
///
/// See [`Linker::process`].
#[must_use]
pub fn process_content_with_links(
    html: &str,
    terms: &[Candidate],
    docs: &[Candidate],
    current_title: &str,
    rules: &[ExceptionRule],
) -> String {
    Linker::new(rules).process(html, terms, docs, current_title)
}

/// Builds the wrapper element for a match.
///
/// The class and data attribute pair is what the viewer dispatches on.
fn link_markup(m: &Match<'_>) -> String {
    let candidate = m.candidate();
    let kind = candidate.kind();
    format!(
        r#"<span class="{}" {}="{}">{}</span>"#,
        kind.css_class(),
        kind.data_attribute(),
        html_escape(candidate.identifier()),
        m.text(),
    )
}

/// Escapes HTML special characters.
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
