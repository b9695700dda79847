//! Changed-file detection.
//!
//! A [`DiffProvider`] reports which paths differ between a base ref and HEAD.
//! Its answer is a [`DiffOutcome`] that keeps "no changes" and "could not
//! tell" apart; [`ChangeSet::from_outcome`] is the one place where the latter
//! is downgraded to an empty set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::obs;

/// Raw answer from a diff provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Provider ran; one entry per output line, not yet normalized.
    Changed(Vec<String>),

    /// Provider failed (spawn error, non-zero exit, timeout, bad output).
    Unavailable(String),
}

/// External diff-provider capability.
pub trait DiffProvider {
    /// Paths changed between `base_ref` and HEAD.
    fn changed_paths(&self, base_ref: &str) -> DiffOutcome;
}

/// Normalized set of repository-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    paths: BTreeSet<String>,
}

impl ChangeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from raw lines: trim, drop blanks, convert `\` to `/`.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = lines
            .into_iter()
            .filter_map(|line| normalize_path(line.as_ref()))
            .collect();
        Self { paths }
    }

    /// Coerce a provider answer into a change set.
    ///
    /// `Unavailable` becomes the empty set. It is logged, never raised.
    pub fn from_outcome(outcome: DiffOutcome) -> Self {
        match outcome {
            DiffOutcome::Changed(lines) => Self::from_lines(lines),
            DiffOutcome::Unavailable(reason) => {
                obs::emit_change_set_unavailable(&reason);
                Self::empty()
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        match normalize_path(path) {
            Some(normalized) => self.paths.contains(&normalized),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

fn normalize_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace('\\', "/"))
}

/// Resolves a base ref to a [`ChangeSet`] through a provider.
pub struct ChangeSetResolver<'a> {
    provider: &'a dyn DiffProvider,
}

impl<'a> ChangeSetResolver<'a> {
    pub fn new(provider: &'a dyn DiffProvider) -> Self {
        Self { provider }
    }

    /// Never fails; provider faults yield the empty set.
    pub fn resolve(&self, base_ref: &str) -> ChangeSet {
        let changes = ChangeSet::from_outcome(self.provider.changed_paths(base_ref));
        obs::emit_change_set_resolved(base_ref, changes.len());
        changes
    }
}
