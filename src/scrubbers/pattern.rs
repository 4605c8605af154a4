//! Regex-driven scrubbing with stable placeholders.
//!
//! Every distinct literal matched by a rule is replaced by
//! `__{prefix}_{ordinal}__`, where the ordinal counts distinct literals in order
//! of first appearance. Repeated occurrences of the same literal share a
//! placeholder, so relations between values survive scrubbing.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Scrubber;
use crate::errors::Result;

static GUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
        .unwrap()
});

static ISO_TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?\b")
        .unwrap()
});

/// One pattern and the prefix of the placeholders it produces.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: Regex,
    pub replacement_prefix: String,
}

impl PatternRule {
    pub fn new(pattern: Regex, replacement_prefix: impl Into<String>) -> Self {
        Self {
            pattern,
            replacement_prefix: replacement_prefix.into(),
        }
    }

    /// Hyphenated GUIDs/UUIDs, placeholders `__Guid_N__`.
    pub fn guids() -> Self {
        Self::new(GUID_PATTERN.clone(), "Guid")
    }

    /// ISO-8601 date-times, placeholders `__Timestamp_N__`.
    pub fn iso_timestamps() -> Self {
        Self::new(ISO_TIMESTAMP_PATTERN.clone(), "Timestamp")
    }

    fn scrub_matches(&self, input: &str) -> String {
        let mut placeholders: HashMap<String, String> = HashMap::new();
        self.pattern
            .replace_all(input, |caps: &Captures| {
                let key = &caps[0];
                if let Some(placeholder) = placeholders.get(key) {
                    return placeholder.clone();
                }
                let placeholder =
                    format!("__{}_{}__", self.replacement_prefix, placeholders.len());
                placeholders.insert(key.to_string(), placeholder.clone());
                placeholder
            })
            .into_owned()
    }
}

/// Applies its rules one after another.
#[derive(Debug, Clone, Default)]
pub struct PatternScrubber {
    rules: Vec<PatternRule>,
}

impl PatternScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: PatternRule) -> Self {
        self.add(rule);
        self
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

impl FromIterator<PatternRule> for PatternScrubber {
    fn from_iter<I: IntoIterator<Item = PatternRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Scrubber for PatternScrubber {
    fn scrub(&self, input: &str) -> Result<String> {
        Ok(self
            .rules
            .iter()
            .fold(input.to_string(), |current, rule| rule.scrub_matches(&current)))
    }
}
