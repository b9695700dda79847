//! docgate core - policy engine for generated documentation artifacts
//!
//! Decides whether the research report, security assessment and
//! orchestration pipeline contract in a working tree satisfy a fixed
//! structural policy:
//! - Section, keyword and trusted-reference scanning over raw text
//! - Change detection against a base ref, with a research/security co-change gate
//! - Stage-dependent requiredness and an aggregated violation report

pub mod artifact;
pub mod changeset;
pub mod config;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod git;
pub mod obs;
pub mod policy;
pub mod report;
pub mod scanner;
pub mod stage;
pub mod telemetry;

// Re-export key types
pub use artifact::{Artifact, ArtifactKind, ArtifactReader, ArtifactState, FsArtifactReader};
pub use changeset::{ChangeSet, ChangeSetResolver, DiffOutcome, DiffProvider};
pub use config::{ArtifactPaths, GateConfig};
pub use engine::{EvaluationRequest, PolicyEngine};
pub use error::{GateError, Result};
pub use git::GitDiffProvider;
pub use policy::{ArtifactPolicy, PolicyRule};
pub use report::{EvaluationReport, ReportDocument, RuleKind, Violation};
pub use stage::{ChangeMode, Requirements, Stage, Touched};
pub use telemetry::init_tracing;
