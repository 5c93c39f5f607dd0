//! A single markdown page: front matter, title and rendered HTML.

use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;

use crate::candidate::{Candidate, CandidateKind};
use crate::render::{preprocess_markdown, render_markdown};

const FRONT_MATTER_FENCE: &str = "---";

/// A document or glossary term loaded from disk.
#[derive(Debug, Clone)]
pub struct Page {
    identifier: String,
    title: String,
    kind: CandidateKind,
    /// Markdown body without front matter.
    content: String,
    /// Rendered HTML, before auto-linking.
    html: String,
    /// Named sections of a term page.
    sections: Option<TermSections>,
}

impl Page {
    /// Builds a page from its source text.
    ///
    /// `identifier` is the page path relative to its docs or terms directory,
    /// without the `.md` extension. `stem` is the file stem, used as the title
    /// of last resort.
    #[must_use]
    pub fn from_source(
        identifier: impl Into<String>,
        stem: &str,
        kind: CandidateKind,
        source: &str,
    ) -> Self {
        let (front_matter, body) = split_front_matter(source);
        let title = resolve_title(front_matter.as_ref(), body, stem);
        let html = render_markdown(&preprocess_markdown(body));
        let sections = (kind == CandidateKind::Term).then(|| TermSections::parse(body));

        Self {
            identifier: identifier.into(),
            title,
            kind,
            content: body.to_string(),
            html,
            sections,
        }
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

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    #[must_use]
    pub const fn sections(&self) -> Option<&TermSections> {
        self.sections.as_ref()
    }

    /// Returns the linking candidate for this page.
    #[must_use]
    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.identifier.clone(), self.title.clone(), self.kind)
    }
}

/// Sections recognized on glossary term pages (`## summary`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermSections {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub siblings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl TermSections {
    /// Collects the non-empty lines under each recognized `## ` heading.
    ///
    /// Section names are matched case-insensitively; lines under any other
    /// `## ` heading are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut sections = Self::default();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("## ") {
                current = Some(name.trim().to_lowercase());
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if let Some(section) = current.as_deref().and_then(|name| sections.section_mut(name)) {
                section.push(line.to_string());
            }
        }

        sections
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "summary" => Some(&mut self.summary),
            "description" => Some(&mut self.description),
            "synonyms" => Some(&mut self.synonyms),
            "antonyms" => Some(&mut self.antonyms),
            "siblings" => Some(&mut self.siblings),
            "parents" => Some(&mut self.parents),
            "children" => Some(&mut self.children),
            _ => None,
        }
    }
}

/// Splits a leading `---` YAML block from the markdown body.
///
/// Invalid YAML is logged and ignored; the block is still removed from the
/// body.
fn split_front_matter(source: &str) -> (Option<Value>, &str) {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = source
        .strip_prefix(FRONT_MATTER_FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let value = match serde_yaml::from_str::<Value>(yaml) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Ignoring invalid front matter: {e}");
                    None
                }
            };
            return (value, body);
        }
        offset += line.len();
    }

    // Unterminated fence: treat everything as body
    (None, source)
}

/// Picks the page title: front matter `title`, first `# ` line, file stem.
fn resolve_title(front_matter: Option<&Value>, body: &str, stem: &str) -> String {
    if let Some(title) = front_matter
        .and_then(|fm| fm.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return title.to_string();
    }

    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| stem.to_string(), str::to_string)
}

/// Returns the file stem of `path` as a string.
#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
