//! Violations and the evaluation report.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::artifact::ArtifactKind;

/// Which check produced a violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// A required artifact does not exist.
    MissingFile,
    MissingSections,
    InsufficientReferences,
    MissingKeyword,
    MissingStage,
    /// Research changed without security changing.
    CoChange,
}

/// A single blocking finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// Artifact the finding is about; `None` for cross-artifact rules.
    pub artifact: Option<ArtifactKind>,
    pub rule: RuleKind,
    /// Human-readable explanation.
    pub message: String,
}

impl Violation {
    pub fn new(artifact: ArtifactKind, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            artifact: Some(artifact),
            rule,
            message: message.into(),
        }
    }

    pub fn co_change() -> Self {
        Self {
            artifact: None,
            rule: RuleKind::CoChange,
            message: "Research artifact changed but security artifact was not changed in this PR."
                .to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of one evaluation. Empty violations means pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Violations in artifact order (research, security, pipeline).
    pub violations: Vec<Violation>,

    /// Set when the co-change gate stopped the run before any policy ran.
    pub gate_blocked: bool,
}

impl EvaluationReport {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            gate_blocked: false,
        }
    }

    pub fn gate_blocked(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
            gate_blocked: true,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Plain-text rendering used on stdout.
    pub fn render_text(&self) -> String {
        if self.passed() {
            return "Validation passed.\n".to_string();
        }
        let mut out = String::from("Validation failed:\n");
        for violation in &self.violations {
            out.push_str("- ");
            out.push_str(&violation.message);
            out.push('\n');
        }
        out
    }

    /// Hex SHA-256 over the rule tags and messages, in order.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(if self.gate_blocked { b"gate\0" as &[u8] } else { b"policy\0" });
        for violation in &self.violations {
            hasher.update(format!("{:?}", violation.rule).as_bytes());
            hasher.update(b"\0");
            hasher.update(violation.message.as_bytes());
            hasher.update(b"\0");
        }
        hex::encode(hasher.finalize())
    }
}

/// JSON document printed by `--format json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportDocument {
    pub passed: bool,
    pub gate_blocked: bool,
    pub violations: Vec<Violation>,
    pub digest: String,
}

impl From<&EvaluationReport> for ReportDocument {
    fn from(report: &EvaluationReport) -> Self {
        Self {
            passed: report.passed(),
            gate_blocked: report.gate_blocked,
            violations: report.violations.clone(),
            digest: report.digest(),
        }
    }
}
