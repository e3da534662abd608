// src/normalize.rs
//! Textual repair of extracted recipe JSON.
//!
//! The extractor emits JSON wrapped in markdown fences, pretty-printed with
//! stray newlines, and quoted inconsistently. The rules below turn that into
//! strict JSON the conversion endpoint accepts. Nothing here parses JSON;
//! structural validation is left to the server.
//!
//! Rules run in a fixed order and later rules assume the earlier cleanup
//! already happened.

use crate::constants::DEFAULT_CORRECTIONS;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Three backticks, plus a language tag when one ends the line.
/// The line break after the tag is captured so it survives.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:[A-Za-z0-9_+\-]+(\r?\n|$))?").expect("code fence pattern is valid")
});

/// Newlines right after `,` `{` `[` or `"`.
static NEWLINE_AFTER_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([,{\["])(?:\r?\n)+"#).expect("opener pattern is valid"));

/// Newlines right before `}` or `]`.
static NEWLINE_BEFORE_CLOSER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\r?\n)+([}\]])").expect("closer pattern is valid"));

/// Replacement for a literal apostrophe.
pub const ESCAPED_APOSTROPHE: &str = r"\u0027";

/// Ordered table of literal substring fixes for known bad extractions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corrections(IndexMap<String, String>);

impl Corrections {
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    /// Adds or replaces entries; later entries win for the same pattern.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in entries {
            let from = from.into();
            if from.is_empty() {
                log::warn!("Ignoring correction with an empty pattern");
                continue;
            }
            self.0.insert(from, to.into());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Corrections {
    fn default() -> Self {
        let mut corrections = Self::empty();
        corrections.extend(DEFAULT_CORRECTIONS.iter().copied());
        corrections
    }
}

/// A single pure text transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairRule {
    /// Drop markdown code fences, with or without a language tag.
    StripCodeFences,
    /// Remove pretty-printing newlines around structural tokens.
    CollapseStructuralNewlines,
    /// Replace `'` with `\u0027`.
    EscapeApostrophes,
    /// Apply literal substring corrections in table order.
    Correct(Corrections),
    /// Rename a legacy object key, e.g. `"title":` to `"name":`.
    RenameKey { from: String, to: String },
}

impl RepairRule {
    /// The `"title"` to `"name"` rename the recipe schema needs.
    pub fn legacy_title_key() -> Self {
        Self::RenameKey {
            from: "title".to_string(),
            to: "name".to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StripCodeFences => "strip-code-fences",
            Self::CollapseStructuralNewlines => "collapse-structural-newlines",
            Self::EscapeApostrophes => "escape-apostrophes",
            Self::Correct(_) => "corrections",
            Self::RenameKey { .. } => "rename-key",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::StripCodeFences => CODE_FENCE.replace_all(text, "${1}").into_owned(),
            Self::CollapseStructuralNewlines => {
                let collapsed = NEWLINE_AFTER_OPENER.replace_all(text, "$1");
                NEWLINE_BEFORE_CLOSER
                    .replace_all(&collapsed, "$1")
                    .into_owned()
            }
            Self::EscapeApostrophes => text.replace('\'', ESCAPED_APOSTROPHE),
            Self::Correct(corrections) => corrections
                .iter()
                .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to)),
            Self::RenameKey { from, to } => {
                text.replace(&format!("\"{}\":", from), &format!("\"{}\":", to))
            }
        }
    }
}

/// Runs the repair rules over a raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNormalizer {
    rules: Vec<RepairRule>,
}

impl TextNormalizer {
    /// The standard rule chain with the given correction table.
    pub fn new(corrections: Corrections) -> Self {
        Self {
            rules: vec![
                RepairRule::StripCodeFences,
                RepairRule::CollapseStructuralNewlines,
                RepairRule::EscapeApostrophes,
                RepairRule::Correct(corrections),
                RepairRule::legacy_title_key(),
            ],
        }
    }

    pub fn rules(&self) -> &[RepairRule] {
        &self.rules
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.rules.iter().fold(raw.to_string(), |text, rule| {
            let repaired = rule.apply(&text);
            if repaired != text {
                log::debug!("Repair rule '{}' changed the document", rule.label());
            }
            repaired
        })
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(Corrections::default())
    }
}
