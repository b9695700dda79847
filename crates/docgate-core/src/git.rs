//! Git-backed diff provider.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::changeset::{DiffOutcome, DiffProvider};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `git diff --name-only <base>...HEAD` inside a working tree.
///
/// The three-dot range compares HEAD with the merge base of `base` and HEAD,
/// i.e. only what the current branch changed.
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    repo_dir: PathBuf,
    timeout: Option<Duration>,
}

impl GitDiffProvider {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            timeout: None,
        }
    }

    /// Kill git and report `Unavailable` if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn run_diff(&self, base_ref: &str) -> Result<String, String> {
        let range = format!("{base_ref}...HEAD");
        let mut child = Command::new("git")
            .args(["diff", "--name-only", &range])
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to run git: {e}"))?;

        // Drain both pipes on their own threads so neither can fill up and
        // stall git while we wait on the exit status.
        let stdout = drain(child.stdout.take(), "stdout")?;
        let stderr = drain(child.stderr.take(), "stderr")?;

        let status = match self.timeout {
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break status,
                        Ok(None) if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(format!(
                                "git diff timed out after {} seconds",
                                limit.as_secs()
                            ));
                        }
                        Ok(None) => std::thread::sleep(POLL_INTERVAL),
                        Err(e) => return Err(format!("failed to wait for git: {e}")),
                    }
                }
            }
            None => child
                .wait()
                .map_err(|e| format!("failed to wait for git: {e}"))?,
        };

        let stdout = collect(stdout, "stdout")?;
        let stderr = collect(stderr, "stderr")?;

        if !status.success() {
            return Err(format!(
                "git diff {range} failed ({status}): {}",
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        String::from_utf8(stdout).map_err(|_| "git diff output is not valid UTF-8".to_string())
    }
}

type PipeReader = JoinHandle<std::io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>, name: &str) -> Result<PipeReader, String> {
    let mut pipe = pipe.ok_or_else(|| format!("git {name} was not captured"))?;
    Ok(std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).map(|_| buf)
    }))
}

fn collect(reader: PipeReader, name: &str) -> Result<Vec<u8>, String> {
    reader
        .join()
        .map_err(|_| format!("git {name} reader panicked"))?
        .map_err(|e| format!("failed to read git {name}: {e}"))
}

impl DiffProvider for GitDiffProvider {
    fn changed_paths(&self, base_ref: &str) -> DiffOutcome {
        match self.run_diff(base_ref) {
            Ok(out) => {
                tracing::debug!(base_ref = %base_ref, bytes = out.len(), "git diff completed");
                DiffOutcome::Changed(out.lines().map(str::to_string).collect())
            }
            Err(reason) => DiffOutcome::Unavailable(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_repo_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GitDiffProvider::new(dir.path());
        match provider.changed_paths("origin/main") {
            DiffOutcome::Unavailable(reason) => assert!(!reason.is_empty()),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let provider = GitDiffProvider::new("/nonexistent/docgate/repo")
            .with_timeout(Some(Duration::from_secs(5)));
        assert!(matches!(
            provider.changed_paths("origin/main"),
            DiffOutcome::Unavailable(_)
        ));
    }

    #[test]
    fn stderr_is_reported_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?}");
        };
        run(&["init"]);
        run(&["config", "user.name", "test-user"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "commit.gpgsign", "false"]);
        std::fs::write(dir.path().join("README.md"), "base\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-m", "initial"]);

        let provider = GitDiffProvider::new(dir.path());
        match provider.changed_paths("no-such-ref") {
            DiffOutcome::Unavailable(reason) => {
                assert!(reason.contains("no-such-ref...HEAD failed"), "{reason}");
                let (_, detail) = reason.split_once("): ").unwrap();
                assert!(!detail.is_empty(), "git stderr missing: {reason}");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
