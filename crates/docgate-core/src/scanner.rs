//! Substring and reference scanning over raw document text.
//!
//! Matching is deliberately shallow: a section or keyword counts as present
//! when it occurs anywhere in the text, ignoring ASCII and Unicode case. No
//! markdown structure is parsed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// Domain whose links count toward the research reference minimum.
pub const DEFAULT_TRUSTED_DOMAIN: &str = "learn.microsoft.com";

/// Longest host name DNS allows.
pub const MAX_DOMAIN_LEN: usize = 253;

static DEFAULT_REFERENCE_PATTERN: LazyLock<ReferencePattern> = LazyLock::new(|| ReferencePattern {
    domain: DEFAULT_TRUSTED_DOMAIN.to_string(),
    regex: compile(DEFAULT_TRUSTED_DOMAIN).expect("default reference pattern compiles"),
});

/// Case-insensitive substring containment.
pub fn has_section(text: &str, label: &str) -> bool {
    text.to_lowercase().contains(&label.to_lowercase())
}

/// Same semantics as [`has_section`]; named for phrase checks.
pub fn has_keyword(text: &str, phrase: &str) -> bool {
    has_section(text, phrase)
}

/// Labels not found in `text`, in input order.
pub fn missing_sections<'a, S: AsRef<str>>(text: &str, labels: &'a [S]) -> Vec<&'a str> {
    let haystack = text.to_lowercase();
    labels
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| !haystack.contains(&label.to_lowercase()))
        .collect()
}

/// Phrases not found in `text`, in input order.
pub fn missing_keywords<'a, S: AsRef<str>>(text: &str, phrases: &'a [S]) -> Vec<&'a str> {
    missing_sections(text, phrases)
}

/// Count links to [`DEFAULT_TRUSTED_DOMAIN`].
pub fn count_references(text: &str) -> usize {
    DEFAULT_REFERENCE_PATTERN.count(text)
}

/// Compiled matcher for `http(s)://<domain>...` links.
///
/// Serializes as its domain string; deserializing compiles the pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferencePattern {
    domain: String,
    regex: Regex,
}

impl ReferencePattern {
    /// Build a matcher for a single trusted domain.
    ///
    /// The domain is escaped, so dots match literally. A match extends to the
    /// first whitespace or closing parenthesis. A domain too large for the
    /// regex engine is a [`GateError::Config`].
    pub fn new(domain: &str) -> Result<Self> {
        if domain == DEFAULT_TRUSTED_DOMAIN {
            return Ok(DEFAULT_REFERENCE_PATTERN.clone());
        }
        let regex = compile(domain).map_err(|e| {
            GateError::Config(format!("trusted_domain cannot be matched: {e}"))
        })?;
        Ok(Self {
            domain: domain.to_string(),
            regex,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Non-overlapping matches; repeated links are counted each time.
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

impl PartialEq for ReferencePattern {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
    }
}

impl Eq for ReferencePattern {}

impl TryFrom<String> for ReferencePattern {
    type Error = GateError;

    fn try_from(domain: String) -> Result<Self> {
        Self::new(&domain)
    }
}

impl From<ReferencePattern> for String {
    fn from(pattern: ReferencePattern) -> Self {
        pattern.domain
    }
}

fn compile(domain: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)https?://{}[^\s)]*", regex::escape(domain)))
}
