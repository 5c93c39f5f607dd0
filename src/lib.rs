//! # wiki-autolink
//!
//! Core of a markdown wiki viewer that automatically cross-links glossary
//! terms and document titles inside rendered HTML.
//!
//! ## Features
//!
//! - Literal, case-sensitive title matching suited to CJK text (no word
//!   boundaries required)
//! - Longest match wins when titles overlap or nest
//! - Pluggable exception rules: self-reference, kanji adjacency, custom
//!   patterns
//! - Never touches tag structure, attribute values or heading text
//! - Table of contents extraction with stable anchor ids
//! - `##term##` explicitly suppresses a link
//!
//! ## Usage
//!
//! ```
//! use wiki_autolink::{Candidate, default_rules, process_content_with_links};
//!
//! let html = "<p>Kubernetes runs Pod objects.</p>";
//! let terms = vec![Candidate::term("t1", "Pod")];
//! let linked = process_content_with_links(html, &terms, &[], "", &default_rules());
//!
//! assert_eq!(
//!     linked,
//!     r#"<p>Kubernetes runs <span class="term-link" data-term="t1">Pod</span> objects.</p>"#
//! );
//! ```
//!
//! ## Generated markup
//!
//! Terms become `<span class="term-link" data-term="{identifier}">` and
//! documents `<span class="doc-link" data-doc="{identifier}">`. The viewer
//! dispatches click and hover behavior on these class/attribute pairs.

pub mod candidate;
pub mod config;
pub mod linker;
pub mod matcher;
pub mod page;
pub mod project;
pub mod render;
pub mod rewriter;
pub mod rules;
pub mod settings;
pub mod toc;

pub use candidate::{Candidate, CandidateKind};
pub use config::Config;
pub use linker::{Linker, process_content_with_links};
pub use matcher::{Match, find_matches, resolve_overlaps};
pub use page::{Page, TermSections};
pub use project::{Project, RenderedPage, Workspace};
pub use rules::{ExceptionRule, RuleKind, RuleSet, default_rules, should_suppress};
pub use settings::{LinkRule, LinkSettings, RuleUpdate};
pub use toc::{TocEntry, extract_toc};
