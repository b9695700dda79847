//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryArtifactReader` and `StaticDiffProvider` that satisfy the
//! trait contracts without touching a working tree or spawning git.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::artifact::{Artifact, ArtifactKind, ArtifactReader};
use crate::changeset::{DiffOutcome, DiffProvider};
use crate::error::{GateError, Result};

// ---------------------------------------------------------------------------
// MemoryArtifactReader
// ---------------------------------------------------------------------------

/// Artifact reader backed by a `HashMap<path, text>`.
#[derive(Debug, Default)]
pub struct MemoryArtifactReader {
    files: HashMap<String, String>,
    broken: Vec<String>,
    reads: Mutex<Vec<String>>,
}

impl MemoryArtifactReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    /// Make reads of `path` fail with a permission error.
    pub fn with_unreadable(mut self, path: impl Into<String>) -> Self {
        self.broken.push(path.into());
        self
    }

    /// Paths read so far, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl ArtifactReader for MemoryArtifactReader {
    fn read(&self, kind: ArtifactKind, path: &str) -> Result<Artifact> {
        self.reads.lock().unwrap().push(path.to_string());

        if self.broken.iter().any(|p| p == path) {
            return Err(GateError::ArtifactRead {
                path: path.into(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ),
            });
        }

        Ok(match self.files.get(path) {
            Some(text) => Artifact::present(kind, path, text.clone()),
            None => Artifact::absent(kind, path),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.broken.iter().any(|p| p == path)
    }
}

// ---------------------------------------------------------------------------
// StaticDiffProvider
// ---------------------------------------------------------------------------

/// Diff provider that returns a fixed outcome and records requested refs.
#[derive(Debug)]
pub struct StaticDiffProvider {
    outcome: DiffOutcome,
    requested: Mutex<Vec<String>>,
}

impl StaticDiffProvider {
    pub fn new(outcome: DiffOutcome) -> Self {
        Self {
            outcome,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn changed<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DiffOutcome::Changed(
            paths.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn unavailable(reason: &str) -> Self {
        Self::new(DiffOutcome::Unavailable(reason.to_string()))
    }

    pub fn requested_refs(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl DiffProvider for StaticDiffProvider {
    fn changed_paths(&self, base_ref: &str) -> DiffOutcome {
        self.requested.lock().unwrap().push(base_ref.to_string());
        self.outcome.clone()
    }
}
