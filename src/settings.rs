//! Persisted link settings: the global switch and the exception rule list.
//!
//! Stored as JSON:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "rules": [
//!     { "id": "self-reference", "type": "self-reference", "enabled": true },
//!     { "id": "kanji-context", "type": "kanji-context", "enabled": false },
//!     { "id": "no-versions", "type": "custom", "config": { "pattern": "^v\\d", "flags": "i" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::rules::{ExceptionRule, RuleKind};

/// Default location of the settings file, relative to the workspace root.
pub const DEFAULT_SETTINGS_PATH: &str = "config/link-settings.json";

const SELF_REFERENCE_TYPE: &str = "self-reference";
const KANJI_CONTEXT_TYPE: &str = "kanji-context";
const CUSTOM_TYPE: &str = "custom";

/// Flags applied to custom rules that do not specify any.
const DEFAULT_CUSTOM_FLAGS: &str = "g";

/// An exception rule with its persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRule {
    id: String,
    name: Option<String>,
    description: String,
    rule: ExceptionRule,
}

impl LinkRule {
    /// Creates a rule entry.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>, rule: ExceptionRule) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: description.into(),
            rule,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn rule(&self) -> &ExceptionRule {
        &self.rule
    }
}

/// Partial update applied by [`LinkSettings::update_rule`].
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    /// Replaces the rule kind; required when the update creates a rule.
    pub kind: Option<RuleKind>,
}

/// Link settings: whether auto-linking runs at all, and which rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    enabled: bool,
    rules: Vec<LinkRule>,
}

/// Raw settings as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSettings {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<RawRuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flags: Option<String>,
}

const fn enabled_by_default() -> bool {
    true
}

/// Returns the built-in rule entries.
#[must_use]
pub fn default_link_rules() -> Vec<LinkRule> {
    vec![
        LinkRule::new(
            SELF_REFERENCE_TYPE,
            "Do not link a page's own title inside that page",
            ExceptionRule::self_reference(),
        ),
        LinkRule::new(
            KANJI_CONTEXT_TYPE,
            "Do not link titles directly adjacent to kanji",
            ExceptionRule::script_adjacency(),
        ),
    ]
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: default_link_rules(),
        }
    }
}

impl LinkSettings {
    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is
    /// logged and also yields the defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            log::debug!("No link settings at {}, using defaults", path.display());
            return Self::default();
        }

        let loaded = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|content| Self::from_json(&content));

        match loaded {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load link settings, using defaults: {e:#}");
                Self::default()
            }
        }
    }

    /// Parses settings from JSON, appending any default rule whose id is
    /// missing.
    ///
    /// Rules with an unknown type, or custom rules without a pattern, are
    /// logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawSettings =
            serde_json::from_str(content).context("Failed to parse link settings")?;

        let mut rules: Vec<LinkRule> = raw.rules.into_iter().filter_map(rule_from_raw).collect();

        let missing: Vec<LinkRule> = default_link_rules()
            .into_iter()
            .filter(|default| !rules.iter().any(|r| r.id == default.id))
            .collect();
        rules.extend(missing);

        Ok(Self {
            enabled: raw.enabled,
            rules,
        })
    }

    /// Serializes the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let raw = RawSettings {
            enabled: self.enabled,
            rules: self.rules.iter().map(rule_to_raw).collect(),
        };
        serde_json::to_string_pretty(&raw).context("Failed to serialize link settings")
    }

    /// Writes the settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Returns true if auto-linking is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    /// Returns the ordered rule list handed to the linker.
    #[must_use]
    pub fn exception_rules(&self) -> Vec<ExceptionRule> {
        self.rules.iter().map(|r| r.rule.clone()).collect()
    }

    /// Patches the rule `id`, or appends a new rule when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if no rule has this id and the update carries no
    /// rule kind to create one from.
    pub fn update_rule(&mut self, id: &str, update: RuleUpdate) -> Result<()> {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.id == id) {
            if let Some(kind) = update.kind {
                let enabled = existing.rule.is_enabled();
                existing.rule = ExceptionRule::new(kind).with_enabled(enabled);
            }
            if let Some(enabled) = update.enabled {
                existing.rule.set_enabled(enabled);
            }
            if let Some(description) = update.description {
                existing.description = description;
            }
            if update.name.is_some() {
                existing.name = update.name;
            }
            return Ok(());
        }

        let Some(kind) = update.kind else {
            bail!("Unknown link rule: {id}");
        };
        self.rules.push(LinkRule {
            id: id.to_string(),
            name: update.name,
            description: update.description.unwrap_or_default(),
            rule: ExceptionRule::new(kind).with_enabled(update.enabled.unwrap_or(true)),
        });
        Ok(())
    }

    /// Removes the rule `id`. Returns false if there was none.
    pub fn delete_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }
}

fn rule_from_raw(raw: RawRule) -> Option<LinkRule> {
    let Some(type_name) = raw.kind.as_deref() else {
        log::warn!("Skipping link rule {:?} without a type", raw.id);
        return None;
    };

    let kind = match type_name {
        SELF_REFERENCE_TYPE => RuleKind::SelfReference,
        KANJI_CONTEXT_TYPE | "script-adjacency" => RuleKind::ScriptAdjacency,
        CUSTOM_TYPE => {
            let config = raw.config.as_ref();
            let Some(pattern) = config.and_then(|c| c.pattern.clone()) else {
                log::warn!("Skipping custom link rule {:?} without a pattern", raw.id);
                return None;
            };
            let flags = config
                .and_then(|c| c.flags.clone())
                .unwrap_or_else(|| DEFAULT_CUSTOM_FLAGS.to_string());
            RuleKind::Custom { pattern, flags }
        }
        other => {
            log::warn!(
                "Skipping link rule {:?} with unknown type '{other}'",
                raw.id
            );
            return None;
        }
    };

    Some(LinkRule {
        id: raw.id.unwrap_or_else(|| type_name.to_string()),
        name: raw.name,
        description: raw.description,
        rule: ExceptionRule::new(kind).with_enabled(raw.enabled.unwrap_or(true)),
    })
}

fn rule_to_raw(rule: &LinkRule) -> RawRule {
    let (type_name, config) = match rule.rule.kind() {
        RuleKind::SelfReference => (SELF_REFERENCE_TYPE, None),
        RuleKind::ScriptAdjacency => (KANJI_CONTEXT_TYPE, None),
        RuleKind::Custom { pattern, flags } => (
            CUSTOM_TYPE,
            Some(RawRuleConfig {
                pattern: Some(pattern.clone()),
                flags: Some(flags.clone()),
            }),
        ),
    };
    RawRule {
        id: Some(rule.id.clone()),
        name: rule.name.clone(),
        description: rule.description.clone(),
        enabled: Some(rule.rule.is_enabled()),
        kind: Some(type_name.to_string()),
        config,
    }
}
