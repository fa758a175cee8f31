//! Runs the compiled `git-file-commit` binary against throwaway repositories.

use git2::Repository;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestRepo {
    dir: TempDir,
    repo: Repository,
    // holds the config file so the user's real config never leaks in
    config_dir: TempDir,
}

impl TestRepo {
    /// repository with a single committed file
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        let test_repo = Self {
            dir,
            repo,
            config_dir: TempDir::new().unwrap(),
        };
        test_repo.write("tracked.txt", "original");
        test_repo.commit_everything();
        test_repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn commit_everything(&self) {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = self.repo.signature().unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, "initial", &tree, &parents)
            .unwrap();
    }

    fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().unwrap();
        walk.push_head().unwrap();
        walk.count()
    }

    fn head_message(&self) -> String {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        head.message().unwrap_or_default().to_string()
    }

    fn config_file(&self) -> std::path::PathBuf {
        self.config_dir.path().join("config.json")
    }

    /// the binary pointed at this repo, with a clean environment
    fn bin(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_git-file-commit"));
        cmd.arg("-C")
            .arg(self.path())
            .env_remove("GIT_FILE_COMMIT_REPO")
            .env_remove("GIT_FILE_COMMIT_MESSAGE")
            .env_remove("GIT_FILE_COMMIT_PER_FILE")
            .env_remove("GIT_FILE_COMMIT_GIT_CLI")
            .env("GIT_FILE_COMMIT_CONFIG", self.config_file());
        cmd
    }
}

fn run(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().expect("failed to run binary");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output, stdout, stderr)
}

#[test]
fn test_help_exits_zero() {
    let status = Command::new(env!("CARGO_BIN_EXE_git-file-commit"))
        .arg("--help")
        .status()
        .expect("failed to run binary");
    assert!(status.success());
}

#[test]
fn test_not_a_repository_fails() {
    let dir = TempDir::new().unwrap();
    let (output, _, stderr) = run(Command::new(env!("CARGO_BIN_EXE_git-file-commit"))
        .arg("-C")
        .arg(dir.path())
        .args(["-m", "msg"])
        .env("GIT_FILE_COMMIT_CONFIG", dir.path().join("none.json")));

    assert!(!output.status.success());
    assert!(stderr.contains("failed to open git repository"), "stderr: {stderr}");
}

#[test]
fn test_clean_tree_reports_no_changes() {
    let repo = TestRepo::new();
    let (output, stdout, _) = run(repo.bin().args(["-m", "msg"]));

    assert!(output.status.success());
    assert!(stdout.contains("no changes to commit"), "stdout: {stdout}");
    assert_eq!(repo.commit_count(), 1);
}

#[test]
fn test_clean_tree_needs_no_message() {
    let repo = TestRepo::new();
    let (output, stdout, _) = run(&mut repo.bin());

    assert!(output.status.success());
    assert!(stdout.contains("no changes to commit"));
}

#[test]
fn test_per_file_commits() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");
    repo.write("new.txt", "untracked");

    let (output, stdout, stderr) = run(repo.bin().args(["-m", "sync files"]));

    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(repo.commit_count(), 3);
    assert_eq!(repo.head_message(), "sync files\n");
    assert!(stdout.contains("staging (add): tracked.txt"), "stdout: {stdout}");
    assert!(stdout.contains("staging (add): new.txt"));
    assert!(stdout.contains("done: 2 committed, 0 failed"), "stdout: {stdout}");
}

#[test]
fn test_aggregate_commit() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");
    repo.write("a/b.txt", "untracked");
    repo.write("c.txt", "untracked");

    let (output, _, stderr) = run(repo.bin().args(["-m", "everything", "--aggregate"]));

    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(repo.commit_count(), 2);
}

#[test]
fn test_deleted_file_is_removed() {
    let repo = TestRepo::new();
    fs::remove_file(repo.path().join("tracked.txt")).unwrap();

    let (output, stdout, _) = run(repo.bin().args(["-m", "drop tracked"]));

    assert!(output.status.success());
    assert!(stdout.contains("staging (remove): tracked.txt"), "stdout: {stdout}");
    let tree = repo.repo.head().unwrap().peel_to_tree().unwrap();
    assert!(tree.get_name("tracked.txt").is_none());
}

#[test]
fn test_dry_run_changes_nothing() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");
    repo.write("new.txt", "untracked");

    let (output, stdout, _) = run(repo.bin().arg("--dry-run"));

    assert!(output.status.success());
    assert!(stdout.contains("add: tracked.txt"), "stdout: {stdout}");
    assert!(stdout.contains("add: new.txt"));
    assert_eq!(repo.commit_count(), 1);
    let statuses = repo.repo.statuses(None).unwrap();
    assert!(statuses.iter().all(|s| !s.status().is_index_new()));
}

#[test]
fn test_missing_message_fails() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");

    let (output, _, stderr) = run(&mut repo.bin());

    assert!(!output.status.success());
    assert!(stderr.contains("no commit message given"), "stderr: {stderr}");
    assert_eq!(repo.commit_count(), 1);
}

#[test]
fn test_message_from_env() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");

    let (output, _, stderr) = run(repo.bin().env("GIT_FILE_COMMIT_MESSAGE", "from env"));

    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(repo.head_message(), "from env\n");
}

#[test]
fn test_config_file_supplies_defaults() {
    let repo = TestRepo::new();
    fs::write(
        repo.config_file(),
        r#"{ "message": "from config", "commit_per_file": false }"#,
    )
    .unwrap();
    repo.write("one.txt", "1");
    repo.write("two.txt", "2");

    let (output, _, stderr) = run(&mut repo.bin());

    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(repo.commit_count(), 2);
    assert_eq!(repo.head_message(), "from config\n");
}

#[test]
fn test_malformed_config_file_fails() {
    let repo = TestRepo::new();
    fs::write(repo.config_file(), "{ not json").unwrap();

    let (output, _, stderr) = run(repo.bin().args(["-m", "msg"]));

    assert!(!output.status.success());
    assert!(stderr.contains("invalid config file"), "stderr: {stderr}");
}

#[test]
fn test_message_from_file() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");
    let message_file = repo.config_dir.path().join("msg.txt");
    fs::write(&message_file, "subject\n\nbody\n\n\n").unwrap();

    let (output, _, stderr) = run(repo.bin().arg("-F").arg(&message_file));

    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(repo.head_message(), "subject\n\nbody\n");
}

#[test]
fn test_already_staged_changes_are_announced() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "staged edit");
    let mut index = repo.repo.index().unwrap();
    index.add_path(Path::new("tracked.txt")).unwrap();
    index.write().unwrap();
    repo.write("new.txt", "untracked");

    let (output, _, stderr) = run(repo.bin().args(["-m", "msg"]));

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(
        stderr.contains("1 already staged path will be included in the first commit"),
        "stderr: {stderr}"
    );
    // the staged edit rides along with the only commit
    assert_eq!(repo.commit_count(), 2);
    let tree = repo.repo.head().unwrap().peel_to_tree().unwrap();
    assert!(tree.get_name("new.txt").is_some());
}

#[test]
fn test_quiet_prints_only_the_summary() {
    let repo = TestRepo::new();
    repo.write("tracked.txt", "modified");

    let (output, stdout, stderr) = run(repo.bin().args(["-q", "-m", "msg"]));

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(!stdout.contains("processing"), "stdout: {stdout}");
    assert!(!stdout.contains("staging ("), "stdout: {stdout}");
    assert!(!stdout.contains("committed "), "stdout: {stdout}");
    assert!(stdout.contains("done: 1 committed, 0 failed"), "stdout: {stdout}");
    assert_eq!(repo.commit_count(), 2);
}
