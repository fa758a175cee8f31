use crate::changeset::ChangeSet;
use anyhow::{Context, Result, bail};
use git2::{Delta, DiffOptions, ErrorCode, Index, Oid, Repository, RepositoryState};
use std::path::{Path, PathBuf};
use std::process::Command;

/// how commits get created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMethod {
    /// libgit2 writes the commit directly
    #[default]
    Native,
    /// shell out to `git commit` so hooks and signing apply
    GitCli,
}

/// version-control operations the committer needs
pub trait Backend {
    /// root of the working tree; changeset paths are relative to it
    fn root(&self) -> &Path;

    /// modified/deleted tracked paths and untracked paths
    fn changes(&self) -> Result<ChangeSet>;

    /// stage a path that exists on disk
    fn stage_add(&mut self, path: &Path) -> Result<()>;

    /// stage the removal of a path that no longer exists on disk
    fn stage_remove(&mut self, path: &Path) -> Result<()>;

    /// commit whatever is staged
    fn commit(&mut self, message: &str) -> Result<Oid>;
}

/// `Backend` on top of a libgit2 repository
pub struct Git2Backend {
    repo: Repository,
    root: PathBuf,
    method: CommitMethod,
}

impl Git2Backend {
    /// open the repository whose working tree is rooted at `path`
    pub fn open(path: &Path, method: CommitMethod) -> Result<Self> {
        let repo = Repository::open(path)
            .with_context(|| format!("failed to open git repository at {}", path.display()))?;

        let Some(root) = repo.workdir().map(Path::to_path_buf) else {
            bail!("{} is a bare repository", path.display());
        };

        // check we're not in the middle of a git operation
        if repo.state() != RepositoryState::Clean {
            bail!("repository is in the middle of an operation (merge, rebase, etc)");
        }

        Ok(Self { repo, root, method })
    }

    pub fn is_head_detached(&self) -> bool {
        self.repo.head_detached().unwrap_or(false)
    }

    /// number of paths already staged against HEAD
    fn staged_count(&self) -> Result<usize> {
        // handle unborn branch (no commits yet) - compare against empty tree
        let tree = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree().context("failed to get tree")?),
            Err(e) if is_unborn(&e) => None,
            Err(e) => return Err(e).context("failed to get HEAD"),
        };

        let diff = self
            .repo
            .diff_tree_to_index(tree.as_ref(), None, None)
            .context("failed to create staged diff")?;
        Ok(diff.deltas().len())
    }

    /// apply `op` to the index and write it to disk, reloading it on failure
    fn update_index(
        &mut self,
        op: impl FnOnce(&mut Index) -> std::result::Result<(), git2::Error>,
    ) -> Result<()> {
        let mut index = self.repo.index().context("failed to get git index")?;

        if let Err(e) = op(&mut index).and_then(|()| index.write()) {
            // rollback by reloading from disk
            if let Err(reload) = index.read(true) {
                crate::warning!("failed to reload index during rollback: {}", reload);
            }
            return Err(e.into());
        }

        Ok(())
    }

    fn commit_native(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index().context("failed to get git index")?;
        let tree_id = index.write_tree().context("failed to write tree")?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self
            .repo
            .signature()
            .context("failed to read commit identity (user.name / user.email)")?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit().context("failed to resolve HEAD")?),
            Err(e) if is_unborn(&e) => None,
            Err(e) => return Err(e).context("failed to get HEAD"),
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let id = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(id)
    }

    /// uses the git binary rather than git2 so commit signing (gpg/ssh)
    /// and git hooks (pre-commit, commit-msg, etc.) work as expected
    fn commit_git_cli(&self, message: &str) -> Result<Oid> {
        let output = Command::new("git")
            .arg("commit")
            .arg("--quiet")
            .arg("--message")
            .arg(message)
            .current_dir(&self.root)
            .output()
            .context("failed to run git commit")?;

        if !output.status.success() {
            bail!(
                "git commit failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // hooks may have touched the index behind our back
        self.repo
            .index()
            .and_then(|mut index| index.read(true))
            .context("failed to reload git index")?;

        self.repo
            .refname_to_id("HEAD")
            .context("failed to resolve HEAD after commit")
    }
}

impl Backend for Git2Backend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn changes(&self) -> Result<ChangeSet> {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);
        let diff = self
            .repo
            .diff_index_to_workdir(None, Some(&mut opts))
            .context("failed to create diff")?;

        let mut changeset = ChangeSet::default();
        for delta in diff.deltas() {
            let (paths, path) = match delta.status() {
                Delta::Deleted => (&mut changeset.tracked, delta.old_file().path()),
                Delta::Modified | Delta::Typechange => {
                    (&mut changeset.tracked, delta.new_file().path())
                }
                Delta::Untracked => (&mut changeset.untracked, delta.new_file().path()),
                _ => continue, // skip ignored, unmodified, conflicted, etc.
            };
            // keep the raw path; a lossy copy may not exist on disk
            if let Some(path) = path {
                paths.push(path.to_path_buf());
            }
        }

        changeset.staged = self.staged_count()?;
        Ok(changeset)
    }

    fn stage_add(&mut self, path: &Path) -> Result<()> {
        self.update_index(|index| index.add_path(path))
            .with_context(|| format!("failed to stage {}", path.display()))
    }

    fn stage_remove(&mut self, path: &Path) -> Result<()> {
        self.update_index(|index| index.remove_path(path))
            .with_context(|| format!("failed to stage removal of {}", path.display()))
    }

    fn commit(&mut self, message: &str) -> Result<Oid> {
        match self.method {
            CommitMethod::Native => self.commit_native(message),
            CommitMethod::GitCli => self.commit_git_cli(message),
        }
    }
}

fn is_unborn(e: &git2::Error) -> bool {
    matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}
