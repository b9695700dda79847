//! Structured observability hooks for one gate evaluation.
//!
//! This module provides:
//! - An evaluation-scoped tracing span via the `EvaluationSpan` RAII guard
//! - Emission functions for key events: change set resolution, per-artifact
//!   evaluation, the co-change gate and the final report
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).

use tracing::info;

use crate::artifact::ArtifactKind;

/// RAII guard that enters a span for the duration of one evaluation.
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    /// Create and enter a span tagged with the stage and change mode.
    pub fn enter(stage: &str, change_aware: bool) -> Self {
        let span = tracing::info_span!("docgate.evaluate", stage = %stage, change_aware);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: change set resolved against a base ref.
pub fn emit_change_set_resolved(base_ref: &str, changed: usize) {
    info!(event = "changeset.resolved", base_ref = %base_ref, changed = changed);
}

/// Emit event: the diff provider could not answer (warning level).
///
/// The run continues with an empty change set.
pub fn emit_change_set_unavailable(reason: &str) {
    tracing::warn!(event = "changeset.unavailable", reason = %reason);
}

/// Emit event: one artifact policy evaluated.
pub fn emit_artifact_evaluated(kind: ArtifactKind, required: bool, present: bool, violations: usize) {
    info!(
        event = "artifact.evaluated",
        artifact = kind.name(),
        required = required,
        present = present,
        violations = violations,
    );
}

/// Emit event: the research/security co-change gate blocked the run.
pub fn emit_gate_blocked(research_path: &str, security_path: &str) {
    tracing::warn!(
        event = "gate.blocked",
        research = %research_path,
        security = %security_path,
    );
}

/// Emit event: evaluation finished.
pub fn emit_report_finished(violations: usize, passed: bool, digest: &str) {
    info!(
        event = "report.finished",
        violations = violations,
        passed = passed,
        digest = %digest,
    );
}
