//! Project layout configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::Deserialize;

/// File name of the optional per-project configuration.
pub const CONFIG_FILE_NAME: &str = "wiki.json";

/// Configuration for one project directory.
///
/// Paths are relative to the project directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding documents, relative to the project root.
    docs_dir: PathBuf,
    /// Directory holding glossary terms, relative to the project root.
    terms_dir: PathBuf,
    /// Glob patterns for pages to leave out of discovery.
    exclude_pages: Vec<Pattern>,
}

/// Raw configuration as deserialized from `wiki.json`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    docs_dir: Option<String>,
    terms_dir: Option<String>,
    exclude_pages: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            terms_dir: PathBuf::from("terms"),
            exclude_pages: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `wiki.json` from `project_dir`, or the defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(content).context("Failed to parse project configuration")?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let exclude_pages: Vec<Pattern> = raw
            .exclude_pages
            .unwrap_or_default()
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    log::warn!("Invalid exclude-pages glob pattern '{p}': {e}");
                    None
                }
            })
            .collect();

        Self {
            docs_dir: raw
                .docs_dir
                .map_or_else(|| PathBuf::from("docs"), PathBuf::from),
            terms_dir: raw
                .terms_dir
                .map_or_else(|| PathBuf::from("terms"), PathBuf::from),
            exclude_pages,
        }
    }

    /// Returns the documents directory, relative to the project root.
    #[must_use]
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Returns the terms directory, relative to the project root.
    #[must_use]
    pub fn terms_dir(&self) -> &Path {
        &self.terms_dir
    }

    /// Checks if the given page path should be left out of discovery.
    ///
    /// `path` is relative to the project root, e.g. `docs/drafts/a.md`.
    #[must_use]
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude_pages.iter().any(|p| p.matches(&path_str))
    }
}
