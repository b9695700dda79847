//! Stage selection and per-stage artifact requiredness.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::error::GateError;

/// Invocation stage. Fixes which artifacts must exist for one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Only the research report is required.
    Research,

    /// Only the security assessment is required.
    Security,

    /// Only the pipeline contract is required.
    Pipeline,

    /// Everything, or everything touched when change-aware.
    #[default]
    Full,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Security => "security",
            Stage::Pipeline => "pipeline",
            Stage::Full => "full",
        }
    }

    /// Requiredness for this stage.
    ///
    /// `touched` only matters for [`Stage::Full`] in change-aware mode; pass
    /// `None` for a full scan.
    pub fn requirements(&self, touched: Option<Touched>) -> Requirements {
        match self {
            Stage::Research => Requirements::only(ArtifactKind::Research),
            Stage::Security => Requirements::only(ArtifactKind::Security),
            Stage::Pipeline => Requirements::only(ArtifactKind::Pipeline),
            Stage::Full => match touched {
                None => Requirements {
                    research: true,
                    security: true,
                    pipeline: true,
                },
                Some(touched) => Requirements {
                    research: touched.research,
                    security: touched.security,
                    pipeline: true,
                },
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "research" => Ok(Stage::Research),
            "security" => Ok(Stage::Security),
            "pipeline" => Ok(Stage::Pipeline),
            "full" => Ok(Stage::Full),
            other => Err(GateError::InvalidStage(other.to_string())),
        }
    }
}

/// Whether change detection is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChangeMode {
    /// Scan the whole tree; no diff.
    #[default]
    FullScan,

    /// Diff against `base_ref` and apply the co-change gate.
    ChangedSince { base_ref: String },
}

impl ChangeMode {
    pub fn changed_since(base_ref: impl Into<String>) -> Self {
        ChangeMode::ChangedSince {
            base_ref: base_ref.into(),
        }
    }

    pub fn is_change_aware(&self) -> bool {
        matches!(self, ChangeMode::ChangedSince { .. })
    }
}

/// Which of research/security count as touched by the current change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touched {
    pub research: bool,
    pub security: bool,
}

/// Per-artifact required flags for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Requirements {
    pub research: bool,
    pub security: bool,
    pub pipeline: bool,
}

impl Requirements {
    fn only(kind: ArtifactKind) -> Self {
        Self {
            research: kind == ArtifactKind::Research,
            security: kind == ArtifactKind::Security,
            pipeline: kind == ArtifactKind::Pipeline,
        }
    }

    pub fn is_required(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Research => self.research,
            ArtifactKind::Security => self.security,
            ArtifactKind::Pipeline => self.pipeline,
        }
    }
}
