//! Record validation.
//!
//! The core only depends on the [`RecordValidator`] trait; validation
//! failures surface as a record's error list plus a falsy save outcome,
//! never as errors. [`RuleValidator`] is the built-in rule-based
//! implementation.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;

use activerow_core::ValidationError;

use crate::record::Record;

/// External collaborator that checks a record before persistence.
pub trait RecordValidator {
    /// Validate a record, optionally restricted to the given attributes.
    ///
    /// Returns the collected errors; an empty list means the record is valid.
    fn validate(&self, record: &Record, attributes: Option<&[String]>) -> ValidationError;
}

/// A single validation rule applied to one or more attributes.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Attribute names the rule applies to.
    pub attributes: Vec<String>,
    /// The constraint.
    pub kind: RuleKind,
}

/// The constraint checked by a [`Rule`].
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// The attribute must be set and non-NULL.
    Required,
    /// String length bounds. Unset and NULL values pass; combine with
    /// `Required` to force presence.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Numeric bounds. Unset and NULL values pass.
    Range { min: Option<f64>, max: Option<f64> },
    /// Regex the string value must match. Unset and NULL values pass.
    Pattern(String),
}

/// Rule-based reference implementation of [`RecordValidator`].
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<Rule>,
}

impl RuleValidator {
    /// A validator with no rules (everything passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for the given attributes.
    #[must_use]
    pub fn rule(mut self, attributes: &[&str], kind: RuleKind) -> Self {
        self.rules.push(Rule {
            attributes: attributes.iter().map(|&a| a.to_string()).collect(),
            kind,
        });
        self
    }

    fn check(
        record: &Record,
        attribute: &str,
        kind: &RuleKind,
        errors: &mut ValidationError,
    ) {
        let value = record.get(attribute);
        match kind {
            RuleKind::Required => {
                if value.is_null() {
                    errors.add_required(attribute);
                }
            }
            RuleKind::Length { min, max } => {
                let Some(text) = value.as_str() else {
                    return;
                };
                let len = text.chars().count();
                if let Some(min) = min {
                    if len < *min {
                        errors.add_min_length(attribute, *min, len);
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        errors.add_max_length(attribute, *max, len);
                    }
                }
            }
            RuleKind::Range { min, max } => {
                let Some(number) = value.as_f64() else {
                    return;
                };
                if let Some(min) = min {
                    if number < *min {
                        errors.add_min(attribute, min, number);
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        errors.add_max(attribute, max, number);
                    }
                }
            }
            RuleKind::Pattern(pattern) => {
                let Some(text) = value.as_str() else {
                    return;
                };
                if !matches_pattern(text, pattern) {
                    errors.add_pattern(attribute, pattern);
                }
            }
        }
    }
}

impl RecordValidator for RuleValidator {
    fn validate(&self, record: &Record, attributes: Option<&[String]>) -> ValidationError {
        let mut errors = ValidationError::new();
        for rule in &self.rules {
            for attribute in &rule.attributes {
                if let Some(filter) = attributes {
                    if !filter.contains(attribute) {
                        continue;
                    }
                }
                Self::check(record, attribute, &rule.kind, &mut errors);
            }
        }
        errors
    }
}

/// Thread-safe cache of compiled regex patterns.
///
/// Patterns are compiled lazily on first use and kept for the lifetime of
/// the process.
struct RegexCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        let regex = Regex::new(pattern)?;
        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(pattern.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::new)
}

/// Check if a string matches a regex pattern, using the process-wide cache.
///
/// An invalid pattern logs a warning and is treated as a non-match;
/// validation stays resilient.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Invalid regex pattern in validation, treating as non-match"
            );
            false
        }
    }
}
