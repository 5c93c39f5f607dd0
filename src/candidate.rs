//! Linkable entities: glossary terms and documents.

use std::cmp::Reverse;
use std::collections::HashSet;

/// Which kind of page a candidate points to.
///
/// The kind decides the markup a match is wrapped in, see
/// [`CandidateKind::css_class`] and [`CandidateKind::data_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Term,
    Document,
}

impl CandidateKind {
    /// Returns the class marker placed on generated link elements.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Term => "term-link",
            Self::Document => "doc-link",
        }
    }

    /// Returns the data attribute carrying the candidate identifier.
    #[must_use]
    pub const fn data_attribute(self) -> &'static str {
        match self {
            Self::Term => "data-term",
            Self::Document => "data-doc",
        }
    }
}

/// A term or document whose title may be auto-linked.
///
/// The identifier is opaque routing data (usually the page path without
/// extension); the title is the literal text searched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    identifier: String,
    title: String,
    kind: CandidateKind,
}

impl Candidate {
    /// Creates a new candidate.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        kind: CandidateKind,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            kind,
        }
    }

    /// Creates a glossary term candidate.
    #[must_use]
    pub fn term(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(identifier, title, CandidateKind::Term)
    }

    /// Creates a document candidate.
    #[must_use]
    pub fn document(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(identifier, title, CandidateKind::Document)
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn kind(&self) -> CandidateKind {
        self.kind
    }
}

/// Prepares candidates for one linking pass.
///
/// Drops candidates with an empty title and repeated identifiers (first one
/// wins), then orders the rest by title length, longest first. The sort is
/// stable, so equal-length titles keep their input order.
#[must_use]
pub fn prepare(candidates: &[Candidate]) -> Vec<&Candidate> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut prepared: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| !c.title.is_empty())
        .filter(|c| seen.insert(c.identifier.as_str()))
        .collect();
    prepared.sort_by_key(|c| Reverse(c.title.chars().count()));
    prepared
}
