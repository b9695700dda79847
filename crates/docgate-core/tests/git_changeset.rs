//! Change detection against real git repositories.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use docgate_core::{
    ChangeMode, ChangeSetResolver, DiffOutcome, DiffProvider, EvaluationRequest, GateConfig,
    GitDiffProvider, PolicyEngine, RuleKind, Stage,
};

fn run_git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

/// Repo with one commit containing a README; returns (dir, base sha).
fn make_git_repo() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
    write(dir.path(), "README.md", "base\n");
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "initial"]);
    let base = run_git(dir.path(), &["rev-parse", "HEAD"]);
    (dir, base)
}

fn commit_all(repo_dir: &Path, message: &str) {
    run_git(repo_dir, &["add", "."]);
    run_git(repo_dir, &["commit", "-m", message]);
}

#[test]
fn git_provider_lists_committed_changes() {
    let (repo, base) = make_git_repo();
    write(repo.path(), "artifacts/research/research.md", "draft\n");
    write(repo.path(), "docs/orchestration/pipeline.md", "Research\n");
    commit_all(repo.path(), "add docs");

    let provider = GitDiffProvider::new(repo.path());
    let set = ChangeSetResolver::new(&provider).resolve(&base);

    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![
            "artifacts/research/research.md",
            "docs/orchestration/pipeline.md"
        ]
    );
}

#[test]
fn git_provider_no_changes_is_empty_but_available() {
    let (repo, base) = make_git_repo();
    let provider = GitDiffProvider::new(repo.path()).with_timeout(Some(Duration::from_secs(30)));

    assert_eq!(provider.changed_paths(&base), DiffOutcome::Changed(Vec::new()));
}

#[test]
fn git_provider_unknown_ref_is_unavailable() {
    let (repo, _) = make_git_repo();
    let provider = GitDiffProvider::new(repo.path());

    match provider.changed_paths("origin/does-not-exist") {
        DiffOutcome::Unavailable(reason) => assert!(reason.contains("failed"), "{reason}"),
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert!(ChangeSetResolver::new(&provider)
        .resolve("origin/does-not-exist")
        .is_empty());
}

#[test]
fn engine_blocks_research_only_branch() {
    let (repo, base) = make_git_repo();
    write(repo.path(), "artifacts/research/research.md", "draft\n");
    commit_all(repo.path(), "research only");

    let engine = PolicyEngine::for_working_tree(GateConfig::default().with_repo_root(repo.path()));
    let report = engine
        .evaluate(&EvaluationRequest::new(
            Stage::Full,
            ChangeMode::changed_since(base),
        ))
        .unwrap();

    assert!(report.gate_blocked);
    assert_eq!(report.violations[0].rule, RuleKind::CoChange);
}

#[test]
fn engine_checks_co_changed_branch() {
    let (repo, base) = make_git_repo();
    write(repo.path(), "artifacts/research/research.md", "draft\n");
    write(
        repo.path(),
        "artifacts/security/securityassessment.md",
        "## Threat model summary\n## Risk register\n## Residual risks\n## References\n",
    );
    write(
        repo.path(),
        "docs/orchestration/pipeline.md",
        "Research -> Validate -> Security\n",
    );
    commit_all(repo.path(), "research and security");

    let engine = PolicyEngine::for_working_tree(GateConfig::default().with_repo_root(repo.path()));
    let report = engine
        .evaluate(&EvaluationRequest::new(
            Stage::Full,
            ChangeMode::changed_since(base),
        ))
        .unwrap();

    assert!(!report.gate_blocked);
    let rules: Vec<RuleKind> = report.violations.iter().map(|v| v.rule).collect();
    assert_eq!(
        rules,
        vec![
            RuleKind::MissingSections,
            RuleKind::InsufficientReferences,
            RuleKind::MissingKeyword,
            RuleKind::MissingKeyword,
            RuleKind::MissingKeyword,
        ]
    );
}
