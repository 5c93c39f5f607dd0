//! Project discovery and page rendering.
//!
//! A workspace keeps its projects under `projects/<name>/`, each with a
//! documents directory and a terms directory of markdown files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::candidate::{Candidate, CandidateKind};
use crate::config::Config;
use crate::linker::Linker;
use crate::page::{Page, TermSections, file_stem};
use crate::settings::LinkSettings;
use crate::toc::{TocEntry, extract_toc};

/// Directory under the workspace root holding the projects.
const PROJECTS_DIR: &str = "projects";

/// A directory of projects.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    /// Lists project names, sorted.
    ///
    /// A subdirectory counts as a project when it has a documents or terms
    /// directory. A workspace without a projects directory has no projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects directory cannot be read or a
    /// project configuration is invalid.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let dir = self.projects_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let config = Config::load(&path)?;
            if path.join(config.docs_dir()).is_dir() || path.join(config.terms_dir()).is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Loads the project `name` with all its pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not exist or a page cannot be
    /// read.
    pub fn open_project(&self, name: &str) -> Result<Project> {
        let root = self.projects_dir().join(name);
        if !root.is_dir() {
            bail!("Project not found: {name}");
        }
        Project::load(name, &root)
    }
}

/// A loaded project: its documents and glossary terms.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    docs: Vec<Page>,
    terms: Vec<Page>,
}

/// A page rendered for display.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
    pub toc: Vec<TocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<TermSections>,
}

impl Project {
    /// Loads every page below the project's documents and terms directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a page cannot be
    /// read.
    pub fn load(name: &str, root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        let docs = load_pages(root, config.docs_dir(), CandidateKind::Document, &config)?;
        let terms = load_pages(root, config.terms_dir(), CandidateKind::Term, &config)?;

        log::info!(
            "Loaded project {name}: {} documents, {} terms",
            docs.len(),
            terms.len()
        );

        Ok(Self {
            name: name.to_string(),
            docs,
            terms,
        })
    }

    /// Creates a project from already loaded pages.
    #[must_use]
    pub fn from_pages(name: impl Into<String>, docs: Vec<Page>, terms: Vec<Page>) -> Self {
        Self {
            name: name.into(),
            docs,
            terms,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn docs(&self) -> &[Page] {
        &self.docs
    }

    #[must_use]
    pub fn terms(&self) -> &[Page] {
        &self.terms
    }

    #[must_use]
    pub fn doc_candidates(&self) -> Vec<Candidate> {
        self.docs.iter().map(Page::candidate).collect()
    }

    #[must_use]
    pub fn term_candidates(&self) -> Vec<Candidate> {
        self.terms.iter().map(Page::candidate).collect()
    }

    /// Finds a page by kind and identifier.
    #[must_use]
    pub fn page(&self, kind: CandidateKind, identifier: &str) -> Option<&Page> {
        let pages = match kind {
            CandidateKind::Document => &self.docs,
            CandidateKind::Term => &self.terms,
        };
        pages.iter().find(|p| p.identifier() == identifier)
    }

    /// Renders `page` with auto-links according to `settings`.
    ///
    /// The outline is taken from the unlinked HTML.
    #[must_use]
    pub fn render_page(&self, page: &Page, settings: &LinkSettings) -> RenderedPage {
        let html = if settings.is_enabled() {
            let linker = Linker::new(&settings.exception_rules());
            linker.process(
                page.html(),
                &self.term_candidates(),
                &self.doc_candidates(),
                page.title(),
            )
        } else {
            page.html().to_string()
        };

        RenderedPage {
            title: page.title().to_string(),
            html,
            toc: extract_toc(page.html()),
            sections: page.sections().cloned(),
        }
    }
}

/// Reads every markdown file below `root/dir`, sorted by path.
fn load_pages(
    root: &Path,
    dir: &Path,
    kind: CandidateKind,
    config: &Config,
) -> Result<Vec<Page>> {
    let base = root.join(dir);
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/**/*.md", glob::Pattern::escape(&base.to_string_lossy()));
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid discovery pattern {pattern}"))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable path: {e}");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        let Ok(relative) = path.strip_prefix(&base) else {
            continue;
        };
        if config.should_exclude(&dir.join(relative)) {
            log::debug!("Excluding page: {}", path.display());
            continue;
        }

        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pages.push(Page::from_source(
            page_identifier(relative),
            &file_stem(&path),
            kind,
            &source,
        ));
    }

    Ok(pages)
}

/// Builds a page identifier: relative path, no extension, `/` separators.
fn page_identifier(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
