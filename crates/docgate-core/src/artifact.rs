//! Governed artifacts and the file-read seam.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// The three governed documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Research report.
    Research,

    /// Security assessment.
    Security,

    /// Orchestration pipeline contract.
    Pipeline,
}

impl ArtifactKind {
    /// All kinds, in evaluation order.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Research,
        ArtifactKind::Security,
        ArtifactKind::Pipeline,
    ];

    /// Stable tag for logs and JSON.
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::Research => "research",
            ArtifactKind::Security => "security",
            ArtifactKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Existence of an artifact at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactState {
    Present(String),
    Absent,
}

/// One artifact as read for a single evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Repository-relative, forward-slash path.
    pub path: String,
    pub state: ArtifactState,
}

impl Artifact {
    pub fn present(kind: ArtifactKind, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            state: ArtifactState::Present(text.into()),
        }
    }

    pub fn absent(kind: ArtifactKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            state: ArtifactState::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, ArtifactState::Present(_))
    }

    /// Text content, if the artifact exists.
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            ArtifactState::Present(text) => Some(text),
            ArtifactState::Absent => None,
        }
    }
}

/// File-read collaborator.
///
/// Ordinary absence is `Ok(Artifact { state: Absent, .. })`; only faults that
/// should abort the run are errors.
pub trait ArtifactReader {
    fn read(&self, kind: ArtifactKind, path: &str) -> Result<Artifact>;

    /// Whether something exists at `path`, without reading it.
    ///
    /// Never fails: an entry that exists but cannot be read still counts.
    fn exists(&self, path: &str) -> bool;
}

/// Reads artifacts from a working tree on disk.
#[derive(Debug, Clone)]
pub struct FsArtifactReader {
    root: PathBuf,
}

impl FsArtifactReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactReader for FsArtifactReader {
    fn read(&self, kind: ArtifactKind, path: &str) -> Result<Artifact> {
        let full = self.root.join(path);
        let bytes = match std::fs::read(&full) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(artifact = kind.name(), path = %path, "artifact absent");
                return Ok(Artifact::absent(kind, path));
            }
            Err(source) => return Err(GateError::ArtifactRead { path: full, source }),
        };

        let text = String::from_utf8(bytes).map_err(|_| GateError::ArtifactEncoding {
            path: full.clone(),
        })?;

        tracing::debug!(artifact = kind.name(), path = %path, bytes = text.len(), "artifact read");
        Ok(Artifact::present(kind, path, text))
    }

    fn exists(&self, path: &str) -> bool {
        self.root.join(path).exists()
    }
}
