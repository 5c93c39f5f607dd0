//! CLI entry point for wiki-autolink.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use wiki_autolink::rules::RuleKind;
use wiki_autolink::settings::DEFAULT_SETTINGS_PATH;
use wiki_autolink::{CandidateKind, LinkSettings, RuleUpdate, Workspace};

/// Markdown wiki viewer with automatic term and document cross-links
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root containing the `projects/` directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Link settings file (default: <root>/config/link-settings.json)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the projects in the workspace
    Projects,

    /// Render a page with auto-links
    Render {
        project: String,
        kind: PageKind,
        /// Page path relative to the docs/terms directory, without `.md`
        identifier: String,
        /// Print title, HTML and outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the outline of a page as JSON
    Toc {
        project: String,
        kind: PageKind,
        identifier: String,
    },

    /// Inspect or edit link exception rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand, Debug)]
enum RulesAction {
    /// Show the configured rules
    List,
    /// Enable a rule
    Enable { id: String },
    /// Disable a rule
    Disable { id: String },
    /// Delete a rule
    Delete { id: String },
    /// Add or replace a custom pattern rule
    AddCustom {
        id: String,
        pattern: String,
        /// Regex flags (i, m, s, x)
        #[arg(long, default_value = "")]
        flags: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Switch auto-linking on or off entirely
    Linking {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PageKind {
    Doc,
    Term,
}

impl From<PageKind> for CandidateKind {
    fn from(kind: PageKind) -> Self {
        match kind {
            PageKind::Doc => Self::Document,
            PageKind::Term => Self::Term,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let workspace = Workspace::new(&cli.root);
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| cli.root.join(DEFAULT_SETTINGS_PATH));
    let mut out = io::stdout().lock();

    match &cli.command {
        Commands::Projects => {
            for name in workspace.list_projects()? {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Render {
            project,
            kind,
            identifier,
            json,
        } => {
            let project = workspace.open_project(project)?;
            let Some(page) = project.page((*kind).into(), identifier) else {
                bail!("Page not found in {}: {identifier}", project.name());
            };
            let settings = LinkSettings::load(&settings_path);
            let rendered = project.render_page(page, &settings);
            if *json {
                serde_json::to_writer_pretty(&mut out, &rendered)?;
                writeln!(out)?;
            } else {
                write!(out, "{}", rendered.html)?;
            }
        }
        Commands::Toc {
            project,
            kind,
            identifier,
        } => {
            let project = workspace.open_project(project)?;
            let Some(page) = project.page((*kind).into(), identifier) else {
                bail!("Page not found in {}: {identifier}", project.name());
            };
            let toc = wiki_autolink::extract_toc(page.html());
            serde_json::to_writer_pretty(&mut out, &toc)?;
            writeln!(out)?;
        }
        Commands::Rules { action } => {
            run_rules(action, &settings_path, &mut out)?;
        }
    }

    Ok(())
}

fn run_rules(action: &RulesAction, settings_path: &Path, out: &mut impl Write) -> Result<()> {
    let mut settings = LinkSettings::load(settings_path);

    match action {
        RulesAction::List => {
            writeln!(
                out,
                "linking: {}",
                if settings.is_enabled() { "on" } else { "off" }
            )?;
            for rule in settings.rules() {
                let state = if rule.rule().is_enabled() { "on " } else { "off" };
                let kind = match rule.rule().kind() {
                    RuleKind::SelfReference => "self-reference".to_string(),
                    RuleKind::ScriptAdjacency => "kanji-context".to_string(),
                    RuleKind::Custom { pattern, flags } => format!("custom /{pattern}/{flags}"),
                };
                writeln!(
                    out,
                    "[{state}] {} ({kind}) {}",
                    rule.id(),
                    rule.description()
                )?;
            }
            return Ok(());
        }
        RulesAction::Enable { id } | RulesAction::Disable { id } => {
            let enabled = matches!(action, RulesAction::Enable { .. });
            settings.update_rule(
                id,
                RuleUpdate {
                    enabled: Some(enabled),
                    ..Default::default()
                },
            )?;
        }
        RulesAction::Delete { id } => {
            if !settings.delete_rule(id) {
                bail!("Unknown link rule: {id}");
            }
        }
        RulesAction::AddCustom {
            id,
            pattern,
            flags,
            description,
        } => {
            settings.update_rule(
                id,
                RuleUpdate {
                    description: description.clone(),
                    kind: Some(RuleKind::Custom {
                        pattern: pattern.clone(),
                        flags: flags.clone(),
                    }),
                    ..Default::default()
                },
            )?;
        }
        RulesAction::Linking { enabled } => settings.set_enabled(*enabled),
    }

    settings
        .save(settings_path)
        .with_context(|| format!("Failed to update {}", settings_path.display()))
}
