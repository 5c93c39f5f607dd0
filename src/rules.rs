//! Exception rules that veto individual matches.
//!
//! Rules are evaluated in list order. Disabled rules are ignored and the
//! first enabled rule that suppresses a match ends the evaluation.

use regex::{Regex, RegexBuilder};

use crate::matcher::Match;

/// The condition an [`ExceptionRule`] checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Suppresses matches equal to the current page's own title.
    SelfReference,
    /// Suppresses matches directly next to a CJK ideograph.
    ScriptAdjacency,
    /// Suppresses matches whose text matches a user-supplied pattern.
    ///
    /// `flags` uses JavaScript flag letters (`i`, `m`, `s`, `x`; `g`, `u`
    /// and `y` are accepted and ignored).
    Custom { pattern: String, flags: String },
}

/// A rule that can prevent a match from becoming a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRule {
    kind: RuleKind,
    enabled: bool,
}

impl ExceptionRule {
    /// Creates an enabled rule of the given kind.
    #[must_use]
    pub const fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn self_reference() -> Self {
        Self::new(RuleKind::SelfReference)
    }

    #[must_use]
    pub const fn script_adjacency() -> Self {
        Self::new(RuleKind::ScriptAdjacency)
    }

    #[must_use]
    pub fn custom(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::new(RuleKind::Custom {
            pattern: pattern.into(),
            flags: flags.into(),
        })
    }

    /// Sets whether the rule takes part in evaluation.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Returns the rules applied when no settings are supplied.
#[must_use]
pub fn default_rules() -> Vec<ExceptionRule> {
    vec![
        ExceptionRule::self_reference(),
        ExceptionRule::script_adjacency(),
    ]
}

/// Enabled rules with custom patterns compiled once per linking pass.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
enum CompiledRule {
    SelfReference,
    ScriptAdjacency,
    Custom(Regex),
}

impl RuleSet {
    /// Compiles the enabled rules, keeping their order.
    ///
    /// Custom rules whose pattern or flags are invalid are logged and left
    /// out; evaluation continues with the remaining rules.
    #[must_use]
    pub fn compile(rules: &[ExceptionRule]) -> Self {
        let rules = rules
            .iter()
            .filter(|rule| rule.enabled)
            .filter_map(|rule| match &rule.kind {
                RuleKind::SelfReference => Some(CompiledRule::SelfReference),
                RuleKind::ScriptAdjacency => Some(CompiledRule::ScriptAdjacency),
                RuleKind::Custom { pattern, flags } => match build_custom_regex(pattern, flags) {
                    Ok(regex) => Some(CompiledRule::Custom(regex)),
                    Err(e) => {
                        log::warn!(
                            "Invalid custom rule pattern '{pattern}' (flags '{flags}'): {e}"
                        );
                        None
                    }
                },
            })
            .collect();
        Self { rules }
    }

    /// Decides whether `m`, found in `full_text`, must stay unlinked.
    #[must_use]
    pub fn should_suppress(&self, m: &Match<'_>, full_text: &str, current_title: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            CompiledRule::SelfReference => m.text() == current_title,
            CompiledRule::ScriptAdjacency => has_ideograph_neighbour(full_text, m.start(), m.end()),
            CompiledRule::Custom(regex) => regex.is_match(m.text()),
        })
    }
}

/// Decides whether `m` must stay unlinked under `rules`.
///
/// Convenience form of [`RuleSet::should_suppress`] that compiles the rules
/// on every call.
#[must_use]
pub fn should_suppress(
    m: &Match<'_>,
    full_text: &str,
    current_title: &str,
    rules: &[ExceptionRule],
) -> bool {
    RuleSet::compile(rules).should_suppress(m, full_text, current_title)
}

/// Builds a regex from a pattern and JavaScript-style flag letters.
fn build_custom_regex(pattern: &str, flags: &str) -> Result<Regex, String> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'g' | 'u' | 'y' => {}
            other => return Err(format!("unsupported flag '{other}'")),
        }
    }
    builder.build().map_err(|e| e.to_string())
}

/// Returns true if the character right before `start` or right at `end` is
/// a CJK ideograph.
fn has_ideograph_neighbour(text: &str, start: usize, end: usize) -> bool {
    let before = text.get(..start).and_then(|s| s.chars().next_back());
    let after = text.get(end..).and_then(|s| s.chars().next());
    before.is_some_and(is_cjk_ideograph) || after.is_some_and(is_cjk_ideograph)
}

/// Returns true for CJK Unified Ideographs and extensions A through G.
#[must_use]
pub const fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x2_0000..=0x2_A6DF
            | 0x2_A700..=0x2_B73F
            | 0x2_B740..=0x2_B81F
            | 0x2_B820..=0x2_CEAF
            | 0x2_CEB0..=0x2_EBEF
            | 0x3_0000..=0x3_134F
    )
}
