//! Gate orchestration.
//!
//! [`PolicyEngine::evaluate`] applies the research/security co-change gate
//! in change-aware mode before touching any artifact content, then reads each
//! artifact once, runs every artifact policy in kind order and concatenates
//! the violations.

use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactKind, ArtifactReader, FsArtifactReader};
use crate::changeset::{ChangeSet, ChangeSetResolver, DiffProvider};
use crate::config::GateConfig;
use crate::error::Result;
use crate::git::GitDiffProvider;
use crate::obs;
use crate::policy::ArtifactPolicy;
use crate::report::{EvaluationReport, Violation};
use crate::stage::{ChangeMode, Requirements, Stage, Touched};

/// What to evaluate in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub stage: Stage,
    pub change_mode: ChangeMode,
}

impl EvaluationRequest {
    pub fn new(stage: Stage, change_mode: ChangeMode) -> Self {
        Self { stage, change_mode }
    }
}

/// The three artifacts as read for one pass.
struct Snapshot {
    research: Artifact,
    security: Artifact,
    pipeline: Artifact,
}

impl Snapshot {
    fn get(&self, kind: ArtifactKind) -> &Artifact {
        match kind {
            ArtifactKind::Research => &self.research,
            ArtifactKind::Security => &self.security,
            ArtifactKind::Pipeline => &self.pipeline,
        }
    }
}

/// Policy engine over injected collaborators.
pub struct PolicyEngine {
    config: GateConfig,
    reader: Box<dyn ArtifactReader>,
    diff: Box<dyn DiffProvider>,
}

impl PolicyEngine {
    pub fn new(
        config: GateConfig,
        reader: Box<dyn ArtifactReader>,
        diff: Box<dyn DiffProvider>,
    ) -> Self {
        Self {
            config,
            reader,
            diff,
        }
    }

    /// Engine over the working tree at `config.repo_root`, using git for diffs.
    pub fn for_working_tree(config: GateConfig) -> Self {
        let reader = FsArtifactReader::new(config.repo_root.clone());
        let diff =
            GitDiffProvider::new(config.repo_root.clone()).with_timeout(config.diff_timeout());
        Self::new(config, Box::new(reader), Box::new(diff))
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run one evaluation.
    ///
    /// Violations are data in the returned report. Errors are an artifact
    /// that exists but cannot be read, or a trusted domain that cannot be
    /// matched. A co-change gate block is decided from paths and existence
    /// alone, so it is reported even when an artifact is unreadable.
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationReport> {
        let _span = obs::EvaluationSpan::enter(
            request.stage.name(),
            request.change_mode.is_change_aware(),
        );

        let touched = match &request.change_mode {
            ChangeMode::FullScan => None,
            ChangeMode::ChangedSince { base_ref } => {
                let changes = ChangeSetResolver::new(self.diff.as_ref()).resolve(base_ref);
                let touched = self.touched(&changes);
                debug!(
                    research = touched.research,
                    security = touched.security,
                    "change detection"
                );

                if touched.research && !touched.security {
                    obs::emit_gate_blocked(&self.config.paths.research, &self.config.paths.security);
                    let report = EvaluationReport::gate_blocked(Violation::co_change());
                    obs::emit_report_finished(report.violations.len(), false, &report.digest());
                    return Ok(report);
                }
                Some(touched)
            }
        };

        let requirements = request.stage.requirements(touched);
        info!(
            stage = %request.stage,
            research = requirements.research,
            security = requirements.security,
            pipeline = requirements.pipeline,
            "evaluating artifacts"
        );

        let policies = ArtifactPolicy::all(&self.config)?;
        let snapshot = self.read_snapshot()?;
        let report = EvaluationReport::from_violations(run_policies(
            &policies,
            &requirements,
            &snapshot,
        ));
        obs::emit_report_finished(report.violations.len(), report.passed(), &report.digest());
        Ok(report)
    }

    fn read_snapshot(&self) -> Result<Snapshot> {
        let paths = &self.config.paths;
        Ok(Snapshot {
            research: self.reader.read(ArtifactKind::Research, &paths.research)?,
            security: self.reader.read(ArtifactKind::Security, &paths.security)?,
            pipeline: self.reader.read(ArtifactKind::Pipeline, &paths.pipeline)?,
        })
    }

    /// Membership in a non-empty change set; existence when the set is empty.
    fn touched(&self, changes: &ChangeSet) -> Touched {
        let paths = &self.config.paths;
        if changes.is_empty() {
            Touched {
                research: self.reader.exists(&paths.research),
                security: self.reader.exists(&paths.security),
            }
        } else {
            Touched {
                research: changes.contains(&paths.research),
                security: changes.contains(&paths.security),
            }
        }
    }
}

fn run_policies(
    policies: &[ArtifactPolicy],
    requirements: &Requirements,
    snapshot: &Snapshot,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for policy in policies {
        let required = requirements.is_required(policy.kind);
        let artifact = snapshot.get(policy.kind);
        let found = policy.evaluate(required, artifact);
        obs::emit_artifact_evaluated(policy.kind, required, artifact.is_present(), found.len());
        violations.extend(found);
    }
    violations
}
