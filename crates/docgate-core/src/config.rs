//! Gate configuration.
//!
//! [`GateConfig::default`] is the production policy. Tests and programmatic
//! callers override individual fields with the `with_*` builders or load a
//! JSON override document.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::error::{GateError, Result};
use crate::scanner::{ReferencePattern, DEFAULT_TRUSTED_DOMAIN, MAX_DOMAIN_LEN};

/// Canonical repository-relative artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArtifactPaths {
    pub research: String,
    pub security: String,
    pub pipeline: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            research: "artifacts/research/research.md".to_string(),
            security: "artifacts/security/securityassessment.md".to_string(),
            pipeline: "docs/orchestration/pipeline.md".to_string(),
        }
    }
}

impl ArtifactPaths {
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Research => &self.research,
            ArtifactKind::Security => &self.security,
            ArtifactKind::Pipeline => &self.pipeline,
        }
    }
}

/// Full policy configuration for one gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Working tree the artifact paths are relative to.
    pub repo_root: PathBuf,

    pub paths: ArtifactPaths,

    pub research_sections: Vec<String>,

    pub security_sections: Vec<String>,

    /// Provenance phrases every research file must mention.
    pub research_keywords: Vec<String>,

    /// Stage names the pipeline contract must mention.
    pub pipeline_stages: Vec<String>,

    pub trusted_domain: String,

    pub min_references: usize,

    /// Base ref used when change detection is requested without one.
    pub default_base_ref: String,

    /// Optional limit on the diff-provider call, in seconds.
    pub diff_timeout_secs: Option<u64>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            paths: ArtifactPaths::default(),
            research_sections: strings(&[
                "## Assumptions",
                "## Known gotchas",
                "## Open questions",
                "## References",
            ]),
            security_sections: strings(&[
                "## Threat model summary",
                "## Risk register",
                "## Residual risks",
                "## References",
            ]),
            research_keywords: strings(&["Source URL", "Access date", "Confidence"]),
            pipeline_stages: strings(&["Research", "Validate", "Security"]),
            trusted_domain: DEFAULT_TRUSTED_DOMAIN.to_string(),
            min_references: 5,
            default_base_ref: "origin/main".to_string(),
            diff_timeout_secs: None,
        }
    }
}

impl GateConfig {
    /// Load a JSON override document. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: GateConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Point the gate at a different working tree.
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = root.into();
        self
    }

    /// Override artifact locations.
    pub fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Override the diff-provider timeout.
    pub fn with_diff_timeout(mut self, secs: Option<u64>) -> Self {
        self.diff_timeout_secs = secs;
        self
    }

    pub fn diff_timeout(&self) -> Option<Duration> {
        self.diff_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Reject configurations that would make every run pass or fail trivially.
    pub fn validate(&self) -> Result<()> {
        for kind in ArtifactKind::ALL {
            if self.paths.get(kind).trim().is_empty() {
                return Err(GateError::Config(format!("{kind} path must not be empty")));
            }
        }
        if self.min_references == 0 {
            return Err(GateError::Config(
                "min_references must be at least 1".to_string(),
            ));
        }
        if self.trusted_domain.trim().is_empty() {
            return Err(GateError::Config(
                "trusted_domain must not be empty".to_string(),
            ));
        }
        if self.trusted_domain.len() > MAX_DOMAIN_LEN {
            return Err(GateError::Config(format!(
                "trusted_domain is {} bytes; at most {MAX_DOMAIN_LEN} allowed",
                self.trusted_domain.len()
            )));
        }
        ReferencePattern::new(&self.trusted_domain)?;
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
